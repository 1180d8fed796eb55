use anyhow::Context as _;
use async_trait::async_trait;
use rocket::{
    fairing::{self, AdHoc},
    Build, Rocket,
};
use rocket_db_pools::Database;
use shared::{AchievementDefinition, Points, PointsChange, Voucher};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::store::TrackerStore;

#[derive(Database, Clone, Debug)]
#[database("green-league")]
pub struct DB(PgPool);

pub mod types;

use types::{
    ActionRecord, AppliedAction, AwardRecord, LeaderboardRecord, LeagueCountRecord, NewAction,
    NewProfile, ProfileRecord, ProfileUpdate, RedeemOutcome, RedemptionRecord, Statistics,
};

const PROFILE_COLUMNS: &str = "id, family_name, email, member_count, points, league, tutorial_completed, created_at, updated_at";
const ACTION_COLUMNS: &str =
    "id, profile_id, action_id, action_title, points_earned, photo_url, completed_at";
const AWARD_COLUMNS: &str =
    "id, profile_id, achievement_id, achievement_name, description, earned_at";
const REDEMPTION_COLUMNS: &str = "id, profile_id, voucher_id, points_spent, code, redeemed_at";

fn to_db_int(value: u32, what: &str) -> anyhow::Result<i32> {
    i32::try_from(value).with_context(|| format!("{what} out of i32 range"))
}

#[async_trait]
impl TrackerStore for DB {
    #[instrument(skip(self))]
    async fn leaderboard(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<LeaderboardRecord>, u64)> {
        let offset = page.saturating_mul(limit);
        let records = sqlx::query_as::<_, LeaderboardRecord>(
            r#"
            SELECT id, family_name, member_count, points, league,
                   RANK() OVER (ORDER BY points DESC) AS place
            FROM profiles
            ORDER BY points DESC, created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.0)
        .await?;

        // TODO: Replace this with a single query
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.0)
            .await?;

        Ok((records, total.max(0) as u64))
    }

    #[instrument(skip(self))]
    async fn leaderboard_place(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT place FROM (
                SELECT id, RANK() OVER (ORDER BY points DESC) AS place
                FROM profiles
            ) ranked
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn league_counts(&self) -> anyhow::Result<Vec<LeagueCountRecord>> {
        Ok(sqlx::query_as::<_, LeagueCountRecord>(
            "SELECT league, COUNT(*) AS families FROM profiles GROUP BY league",
        )
        .fetch_all(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn statistics(&self) -> anyhow::Result<Statistics> {
        Ok(sqlx::query_as::<_, Statistics>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM profiles) AS families,
                (SELECT COUNT(*) FROM user_actions) AS actions,
                (SELECT COALESCE(SUM(points), 0)::BIGINT FROM profiles) AS total_points,
                (SELECT COUNT(*) FROM achievements) AS achievements,
                (SELECT COUNT(*) FROM redemptions) AS redemptions
            "#,
        )
        .fetch_one(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn profile(&self, id: Uuid) -> anyhow::Result<Option<ProfileRecord>> {
        Ok(sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn create_profile(&self, profile: &NewProfile) -> anyhow::Result<Option<ProfileRecord>> {
        Ok(sqlx::query_as::<_, ProfileRecord>(&format!(
            r#"
            INSERT INTO profiles (id, family_name, email, member_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.id)
        .bind(&profile.family_name)
        .bind(&profile.email)
        .bind(to_db_int(profile.member_count, "member_count")?)
        .fetch_optional(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<ProfileRecord>> {
        let member_count = update
            .member_count
            .map(|count| to_db_int(count, "member_count"))
            .transpose()?;

        Ok(sqlx::query_as::<_, ProfileRecord>(&format!(
            r#"
            UPDATE profiles
            SET family_name = COALESCE($2, family_name),
                member_count = COALESCE($3, member_count),
                updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.family_name.as_deref())
        .bind(member_count)
        .fetch_optional(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn complete_tutorial(&self, id: Uuid) -> anyhow::Result<Option<ProfileRecord>> {
        Ok(sqlx::query_as::<_, ProfileRecord>(&format!(
            r#"
            UPDATE profiles
            SET tutorial_completed = TRUE, updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn append_action(
        &self,
        id: Uuid,
        action: &NewAction,
    ) -> anyhow::Result<Option<AppliedAction>> {
        let mut tx = self.0.begin().await?;

        // Row lock serializes concurrent actions of the same family.
        let Some(profile) = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let change = PointsChange::apply(profile.points(), action.kind.points());

        let record = sqlx::query_as::<_, ActionRecord>(&format!(
            r#"
            INSERT INTO user_actions (id, profile_id, action_id, action_title, points_earned, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(action.kind.to_string())
        .bind(action.kind.title())
        .bind(to_db_int(action.kind.points(), "points_earned")?)
        .bind(action.photo_url.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, ProfileRecord>(&format!(
            r#"
            UPDATE profiles
            SET points = $2, league = $3, updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to_db_int(change.new_points, "points")?)
        .bind(change.new_league.to_string())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(AppliedAction {
            action: record,
            profile,
            change,
        }))
    }

    #[instrument(skip(self))]
    async fn actions(
        &self,
        id: Uuid,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<ActionRecord>, u64)> {
        let offset = page.saturating_mul(limit);
        let records = sqlx::query_as::<_, ActionRecord>(&format!(
            r#"
            SELECT {ACTION_COLUMNS}
            FROM user_actions
            WHERE profile_id = $1
            ORDER BY completed_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.0)
        .await?;

        let total = self.action_count(id).await?;
        Ok((records, total))
    }

    #[instrument(skip(self))]
    async fn all_actions(&self, id: Uuid) -> anyhow::Result<Vec<ActionRecord>> {
        Ok(sqlx::query_as::<_, ActionRecord>(&format!(
            "SELECT {ACTION_COLUMNS} FROM user_actions WHERE profile_id = $1 ORDER BY completed_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn action_count(&self, id: Uuid) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_actions WHERE profile_id = $1")
            .bind(id)
            .fetch_one(&self.0)
            .await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self))]
    async fn awards(&self, id: Uuid) -> anyhow::Result<Vec<AwardRecord>> {
        Ok(sqlx::query_as::<_, AwardRecord>(&format!(
            "SELECT {AWARD_COLUMNS} FROM achievements WHERE profile_id = $1 ORDER BY earned_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.0)
        .await?)
    }

    #[instrument(skip(self, achievement), fields(achievement = achievement.name))]
    async fn insert_award(
        &self,
        id: Uuid,
        achievement: &AchievementDefinition,
    ) -> anyhow::Result<Option<AwardRecord>> {
        Ok(sqlx::query_as::<_, AwardRecord>(&format!(
            r#"
            INSERT INTO achievements (id, profile_id, achievement_id, achievement_name, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (profile_id, achievement_id) DO NOTHING
            RETURNING {AWARD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(to_db_int(achievement.id, "achievement_id")?)
        .bind(achievement.name)
        .bind(achievement.description)
        .fetch_optional(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn redemptions(&self, id: Uuid) -> anyhow::Result<Vec<RedemptionRecord>> {
        Ok(sqlx::query_as::<_, RedemptionRecord>(&format!(
            "SELECT {REDEMPTION_COLUMNS} FROM redemptions WHERE profile_id = $1 ORDER BY redeemed_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.0)
        .await?)
    }

    #[instrument(skip(self))]
    async fn spent_points(&self, id: Uuid) -> anyhow::Result<Points> {
        let spent: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points_spent), 0)::BIGINT FROM redemptions WHERE profile_id = $1",
        )
        .bind(id)
        .fetch_one(&self.0)
        .await?;
        Points::try_from(spent).context("spent points out of u32 range")
    }

    #[instrument(skip(self))]
    async fn redeem(
        &self,
        id: Uuid,
        voucher: Voucher,
        code: &str,
    ) -> anyhow::Result<RedeemOutcome> {
        let mut tx = self.0.begin().await?;

        let Some(points) = sqlx::query_scalar::<_, i32>(
            "SELECT points FROM profiles WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(RedeemOutcome::ProfileNotFound);
        };

        let spent: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points_spent), 0)::BIGINT FROM redemptions WHERE profile_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let balance = (points as i64 - spent).clamp(0, Points::MAX as i64) as Points;
        if let Some(missing) = voucher.missing_points(balance) {
            return Ok(RedeemOutcome::Insufficient { missing });
        }

        let record = sqlx::query_as::<_, RedemptionRecord>(&format!(
            r#"
            INSERT INTO redemptions (id, profile_id, voucher_id, points_spent, code)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REDEMPTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(voucher.to_string())
        .bind(to_db_int(voucher.cost(), "points_spent")?)
        .bind(code)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RedeemOutcome::Redeemed(record))
    }
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                tracing::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

/// Attaches the pool and the migrations. Both run in the ignite batch that follows,
/// so whatever needs the pool has to be attached next to them.
pub fn attach(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(DB::init())
        .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
}
