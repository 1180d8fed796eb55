use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use shared::{AchievementDefinition, League, Points, PointsChange, Voucher};
use uuid::Uuid;

use crate::{
    db::types::{
        ActionRecord, AppliedAction, AwardRecord, LeaderboardRecord, LeagueCountRecord,
        NewAction, NewProfile, ProfileRecord, ProfileUpdate, RedeemOutcome, RedemptionRecord,
        Statistics,
    },
    store::TrackerStore,
};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, ProfileRecord>,
    actions: Vec<ActionRecord>,
    awards: Vec<AwardRecord>,
    redemptions: Vec<RedemptionRecord>,
}

/// Store keeping everything in memory. Each call takes the lock once, so every
/// operation is atomic the same way the Postgres transactions are.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_awards: bool,
}

impl MemoryStore {
    pub fn failing_awards() -> Self {
        Self {
            fail_awards: true,
            ..Default::default()
        }
    }

    fn tables(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    /// Appends a raw action row, bypassing validation and the points update.
    pub fn push_action(&self, record: ActionRecord) {
        self.tables().unwrap().actions.push(record);
    }

    /// Sets the lifetime points directly, bypassing the action log.
    pub fn set_points(&self, id: Uuid, points: Points) {
        let mut tables = self.tables().unwrap();
        let profile = tables.profiles.get_mut(&id).unwrap();
        profile.points = points as i32;
        profile.league = shared::league_for(points).to_string();
    }
}

#[async_trait]
impl TrackerStore for MemoryStore {
    async fn profile(&self, id: Uuid) -> anyhow::Result<Option<ProfileRecord>> {
        Ok(self.tables()?.profiles.get(&id).cloned())
    }

    async fn create_profile(&self, profile: &NewProfile) -> anyhow::Result<Option<ProfileRecord>> {
        let mut tables = self.tables()?;
        if tables.profiles.contains_key(&profile.id) {
            return Ok(None);
        }
        let now = Utc::now();
        let record = ProfileRecord {
            id: profile.id,
            family_name: profile.family_name.clone(),
            email: profile.email.clone(),
            member_count: profile.member_count as i32,
            points: 0,
            league: League::default().to_string(),
            tutorial_completed: false,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(profile.id, record.clone());
        Ok(Some(record))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<ProfileRecord>> {
        let mut tables = self.tables()?;
        let Some(profile) = tables.profiles.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.family_name {
            profile.family_name = name.clone();
        }
        if let Some(count) = update.member_count {
            profile.member_count = count as i32;
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn complete_tutorial(&self, id: Uuid) -> anyhow::Result<Option<ProfileRecord>> {
        let mut tables = self.tables()?;
        let Some(profile) = tables.profiles.get_mut(&id) else {
            return Ok(None);
        };
        profile.tutorial_completed = true;
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn append_action(
        &self,
        id: Uuid,
        action: &NewAction,
    ) -> anyhow::Result<Option<AppliedAction>> {
        let mut tables = self.tables()?;
        let Some(profile) = tables.profiles.get_mut(&id) else {
            return Ok(None);
        };

        let change = PointsChange::apply(profile.points(), action.kind.points());
        let now = Utc::now();
        profile.points = change.new_points as i32;
        profile.league = change.new_league.to_string();
        profile.updated_at = now;
        let profile = profile.clone();

        let record = ActionRecord {
            id: Uuid::new_v4(),
            profile_id: id,
            action_id: action.kind.to_string(),
            action_title: action.kind.title().to_string(),
            points_earned: action.kind.points() as i32,
            photo_url: action.photo_url.clone(),
            completed_at: now,
        };
        tables.actions.push(record.clone());

        Ok(Some(AppliedAction {
            action: record,
            profile,
            change,
        }))
    }

    async fn actions(
        &self,
        id: Uuid,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<ActionRecord>, u64)> {
        let all = self.all_actions(id).await?;
        let total = all.len() as u64;
        let records = all
            .into_iter()
            .skip(page.saturating_mul(limit).max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((records, total))
    }

    async fn all_actions(&self, id: Uuid) -> anyhow::Result<Vec<ActionRecord>> {
        Ok(self
            .tables()?
            .actions
            .iter()
            .rev()
            .filter(|a| a.profile_id == id)
            .cloned()
            .collect())
    }

    async fn action_count(&self, id: Uuid) -> anyhow::Result<u64> {
        Ok(self
            .tables()?
            .actions
            .iter()
            .filter(|a| a.profile_id == id)
            .count() as u64)
    }

    async fn awards(&self, id: Uuid) -> anyhow::Result<Vec<AwardRecord>> {
        Ok(self
            .tables()?
            .awards
            .iter()
            .rev()
            .filter(|a| a.profile_id == id)
            .cloned()
            .collect())
    }

    async fn insert_award(
        &self,
        id: Uuid,
        achievement: &AchievementDefinition,
    ) -> anyhow::Result<Option<AwardRecord>> {
        if self.fail_awards {
            anyhow::bail!("achievements table unavailable");
        }
        let mut tables = self.tables()?;
        let achievement_id = achievement.id as i32;
        if tables
            .awards
            .iter()
            .any(|a| a.profile_id == id && a.achievement_id == achievement_id)
        {
            return Ok(None);
        }
        let record = AwardRecord {
            id: Uuid::new_v4(),
            profile_id: id,
            achievement_id,
            achievement_name: achievement.name.to_string(),
            description: achievement.description.to_string(),
            earned_at: Utc::now(),
        };
        tables.awards.push(record.clone());
        Ok(Some(record))
    }

    async fn redemptions(&self, id: Uuid) -> anyhow::Result<Vec<RedemptionRecord>> {
        Ok(self
            .tables()?
            .redemptions
            .iter()
            .rev()
            .filter(|r| r.profile_id == id)
            .cloned()
            .collect())
    }

    async fn spent_points(&self, id: Uuid) -> anyhow::Result<Points> {
        let tables = self.tables()?;
        Ok(spent(&tables, id))
    }

    async fn redeem(
        &self,
        id: Uuid,
        voucher: Voucher,
        code: &str,
    ) -> anyhow::Result<RedeemOutcome> {
        let mut tables = self.tables()?;
        let Some(profile) = tables.profiles.get(&id) else {
            return Ok(RedeemOutcome::ProfileNotFound);
        };
        let balance = profile.points().saturating_sub(spent(&tables, id));
        if let Some(missing) = voucher.missing_points(balance) {
            return Ok(RedeemOutcome::Insufficient { missing });
        }

        let record = RedemptionRecord {
            id: Uuid::new_v4(),
            profile_id: id,
            voucher_id: voucher.to_string(),
            points_spent: voucher.cost() as i32,
            code: code.to_string(),
            redeemed_at: Utc::now(),
        };
        tables.redemptions.push(record.clone());
        Ok(RedeemOutcome::Redeemed(record))
    }

    async fn leaderboard(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<LeaderboardRecord>, u64)> {
        let tables = self.tables()?;
        let total = tables.profiles.len() as u64;
        let records = tables
            .profiles
            .values()
            .sorted_by(|a, b| {
                b.points
                    .cmp(&a.points)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .map(|p| LeaderboardRecord {
                id: p.id,
                family_name: p.family_name.clone(),
                member_count: p.member_count,
                points: p.points,
                league: p.league.clone(),
                place: place(&tables, p.points),
            })
            .skip(page.saturating_mul(limit).max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((records, total))
    }

    async fn leaderboard_place(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let tables = self.tables()?;
        Ok(tables
            .profiles
            .get(&id)
            .map(|p| place(&tables, p.points)))
    }

    async fn league_counts(&self) -> anyhow::Result<Vec<LeagueCountRecord>> {
        Ok(self
            .tables()?
            .profiles
            .values()
            .counts_by(|p| p.league.clone())
            .into_iter()
            .map(|(league, families)| LeagueCountRecord {
                league,
                families: families as i64,
            })
            .collect())
    }

    async fn statistics(&self) -> anyhow::Result<Statistics> {
        let tables = self.tables()?;
        Ok(Statistics {
            families: tables.profiles.len() as i64,
            actions: tables.actions.len() as i64,
            total_points: tables.profiles.values().map(|p| p.points as i64).sum(),
            achievements: tables.awards.len() as i64,
            redemptions: tables.redemptions.len() as i64,
        })
    }
}

fn spent(tables: &Tables, id: Uuid) -> Points {
    tables
        .redemptions
        .iter()
        .filter(|r| r.profile_id == id)
        .map(|r| r.points_spent.max(0) as Points)
        .sum()
}

fn place(tables: &Tables, points: i32) -> i64 {
    1 + tables
        .profiles
        .values()
        .filter(|p| p.points > points)
        .count() as i64
}
