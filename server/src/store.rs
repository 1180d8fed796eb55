use async_trait::async_trait;
use shared::{AchievementDefinition, Points, Voucher};
use uuid::Uuid;

use crate::db::types::{
    ActionRecord, AppliedAction, AwardRecord, LeaderboardRecord, LeagueCountRecord, NewAction,
    NewProfile, ProfileRecord, ProfileUpdate, RedeemOutcome, RedemptionRecord, Statistics,
};

/// Persistence boundary of the tracker.
///
/// Implementations must write the points total and the league label together
/// with the appended action, and must never store the same achievement twice
/// for one profile.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    async fn profile(&self, id: Uuid) -> anyhow::Result<Option<ProfileRecord>>;

    /// Returns `None` when a profile with the same id already exists.
    async fn create_profile(&self, profile: &NewProfile) -> anyhow::Result<Option<ProfileRecord>>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<ProfileRecord>>;

    async fn complete_tutorial(&self, id: Uuid) -> anyhow::Result<Option<ProfileRecord>>;

    /// Appends the action and applies its points atomically. `None` if the profile is unknown.
    async fn append_action(
        &self,
        id: Uuid,
        action: &NewAction,
    ) -> anyhow::Result<Option<AppliedAction>>;

    /// Newest first.
    async fn actions(
        &self,
        id: Uuid,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<ActionRecord>, u64)>;

    async fn all_actions(&self, id: Uuid) -> anyhow::Result<Vec<ActionRecord>>;

    async fn action_count(&self, id: Uuid) -> anyhow::Result<u64>;

    async fn awards(&self, id: Uuid) -> anyhow::Result<Vec<AwardRecord>>;

    /// Returns `None` if the achievement was already awarded.
    async fn insert_award(
        &self,
        id: Uuid,
        achievement: &AchievementDefinition,
    ) -> anyhow::Result<Option<AwardRecord>>;

    async fn redemptions(&self, id: Uuid) -> anyhow::Result<Vec<RedemptionRecord>>;

    async fn spent_points(&self, id: Uuid) -> anyhow::Result<Points>;

    async fn redeem(&self, id: Uuid, voucher: Voucher, code: &str)
        -> anyhow::Result<RedeemOutcome>;

    /// Families ranked by lifetime points, ties share a place.
    async fn leaderboard(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<LeaderboardRecord>, u64)>;

    async fn leaderboard_place(&self, id: Uuid) -> anyhow::Result<Option<i64>>;

    async fn league_counts(&self) -> anyhow::Result<Vec<LeagueCountRecord>>;

    async fn statistics(&self) -> anyhow::Result<Statistics>;
}
