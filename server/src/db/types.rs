use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{GreenAction, Points, PointsChange};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub family_name: String,
    pub email: String,
    pub member_count: i32,
    pub points: i32,
    pub league: String,
    pub tutorial_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn points(&self) -> Points {
        self.points.max(0) as Points
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
pub struct ActionRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub action_id: String,
    pub action_title: String,
    pub points_earned: i32,
    pub photo_url: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ActionRecord {
    pub fn kind(&self) -> Option<GreenAction> {
        self.action_id.parse().ok()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
pub struct AwardRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub achievement_id: i32,
    pub achievement_name: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
pub struct RedemptionRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub voucher_id: String,
    pub points_spent: i32,
    pub code: String,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub id: Uuid,
    pub family_name: String,
    pub member_count: i32,
    pub points: i32,
    pub league: String,
    pub place: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeagueCountRecord {
    pub league: String,
    pub families: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, Default)]
pub struct Statistics {
    pub families: i64,
    pub actions: i64,
    pub total_points: i64,
    pub achievements: i64,
    pub redemptions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub family_name: String,
    pub email: String,
    pub member_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    pub family_name: Option<String>,
    pub member_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAction {
    pub kind: GreenAction,
    pub photo_url: Option<String>,
}

/// Result of appending an action: the stored record and the profile after the points update.
#[derive(Debug, Clone)]
pub struct AppliedAction {
    pub action: ActionRecord,
    pub profile: ProfileRecord,
    pub change: PointsChange,
}

#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    Redeemed(RedemptionRecord),
    Insufficient { missing: Points },
    ProfileNotFound,
}
