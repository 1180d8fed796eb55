use chrono::{DateTime, Utc};
use green_league_server::{
    db::types::{
        ActionRecord, AwardRecord, LeaderboardRecord, ProfileRecord, RedemptionRecord,
        Statistics as StatisticsRecord,
    },
    tracker::{ActionOutcome, AchievementCheck},
};
use serde::{Deserialize, Serialize};
use shared::{
    achievement, league_for, GreenAction, League, Points, Promotion, Requirement, Voucher,
    VoucherCategory,
};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u64 = 50;
pub const MAX_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE: u64 = 1_000_000;

/// Zero-based page clamped to `MAX_PAGE` and a limit clamped to `1..=MAX_PAGE_LIMIT`.
pub fn page_params(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(0).min(MAX_PAGE),
        limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
    )
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, ToSchema)]
#[aliases(PaginatedLeaderboardResponse = PaginatedResponse<LeaderboardResponse>, PaginatedActionResponse = PaginatedResponse<ActionResponse>)]
pub struct PaginatedResponse<T: Serialize> {
    pub records: Vec<T>,
    pub page: u64,
    pub total_pages: u64,
    pub limit: u64,
    pub total_records: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(records: Vec<T>, page: u64, limit: u64, total_records: u64) -> Self {
        let limit = limit.max(1);
        Self {
            records,
            page,
            total_pages: total_records.div_ceil(limit),
            limit,
            total_records,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    pub family_name: String,
    pub email: String,
    pub member_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub family_name: Option<String>,
    pub member_count: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeagueProgress {
    pub league: League,
    pub next_league: Option<League>,
    pub points_to_next: Option<Points>,
    /// Percent of the way to the next league.
    pub progress: u32,
}

impl LeagueProgress {
    pub fn new(points: Points) -> Self {
        let league = league_for(points);
        Self {
            league,
            next_league: league.next(),
            points_to_next: league.points_to_next(points),
            progress: league.progress(points),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub family_name: String,
    pub email: String,
    pub member_count: u32,
    pub points: Points,
    pub balance: Points,
    pub league: LeagueProgress,
    pub tutorial_completed: bool,
    pub leaderboard_place: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn new(profile: ProfileRecord, balance: Points, place: Option<i64>) -> Self {
        let points = profile.points();
        Self {
            id: profile.id,
            family_name: profile.family_name,
            email: profile.email,
            member_count: profile.member_count.max(0) as u32,
            points,
            balance,
            league: LeagueProgress::new(points),
            tutorial_completed: profile.tutorial_completed,
            leaderboard_place: place.map(|p| p.max(0) as u64),
            created_at: profile.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionCatalogEntry {
    pub action: GreenAction,
    pub title: String,
    pub description: String,
    pub points: Points,
    pub requires_photo: bool,
}

impl From<GreenAction> for ActionCatalogEntry {
    fn from(action: GreenAction) -> Self {
        Self {
            action,
            title: action.title().to_string(),
            description: action.description().to_string(),
            points: action.points(),
            requires_photo: action.requires_photo(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordActionRequest {
    pub action: GreenAction,
    /// Reference to the uploaded photo proof.
    pub photo_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub id: Uuid,
    pub action: String,
    pub title: String,
    pub points_earned: Points,
    pub photo_url: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl From<ActionRecord> for ActionResponse {
    fn from(record: ActionRecord) -> Self {
        Self {
            id: record.id,
            action: record.action_id,
            title: record.action_title,
            points_earned: record.points_earned.max(0) as Points,
            photo_url: record.photo_url,
            completed_at: record.completed_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EarnedAchievement {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub earned_at: DateTime<Utc>,
}

impl From<AwardRecord> for EarnedAchievement {
    fn from(record: AwardRecord) -> Self {
        let id = record.achievement_id.max(0) as u32;
        Self {
            id,
            name: record.achievement_name,
            description: record.description,
            icon: achievement(id).map(|a| a.icon.to_string()),
            earned_at: record.earned_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordActionResponse {
    pub action: ActionResponse,
    pub points: Points,
    pub league: LeagueProgress,
    pub promotion: Option<Promotion>,
    pub awarded: Vec<EarnedAchievement>,
    pub achievements: Vec<EarnedAchievement>,
}

impl From<ActionOutcome> for RecordActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        let points = outcome.profile.points();
        Self {
            action: outcome.action.into(),
            points,
            league: LeagueProgress::new(points),
            promotion: outcome.promotion,
            awarded: outcome.awarded.into_iter().map(Into::into).collect(),
            achievements: outcome.achievements.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AchievementResponse {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub requirement: String,
    pub points_reward: Points,
    pub earned_at: Option<DateTime<Utc>>,
}

impl AchievementResponse {
    pub fn requirement_text(requirement: &Requirement) -> String {
        match requirement {
            Requirement::Points(points) => format!("Earn {points} points"),
            Requirement::League(league) => format!("Reach {league} league"),
            Requirement::ActionCount(1) => "Complete 1 green action".to_string(),
            Requirement::ActionCount(count) => format!("Complete {count} green actions"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AchievementCheckResponse {
    pub awarded: Vec<EarnedAchievement>,
    pub achievements: Vec<EarnedAchievement>,
}

impl From<AchievementCheck> for AchievementCheckResponse {
    fn from(check: AchievementCheck) -> Self {
        Self {
            awarded: check.awarded.into_iter().map(Into::into).collect(),
            achievements: check.achievements.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    pub id: Uuid,
    pub family_name: String,
    pub member_count: u32,
    pub points: Points,
    pub league: League,
    pub place: u64,
}

impl From<LeaderboardRecord> for LeaderboardResponse {
    fn from(record: LeaderboardRecord) -> Self {
        let points = record.points.max(0) as Points;
        Self {
            id: record.id,
            family_name: record.family_name,
            member_count: record.member_count.max(0) as u32,
            points,
            league: league_for(points),
            place: record.place.max(0) as u64,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaguePopulation {
    pub league: League,
    pub threshold: Points,
    pub families: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaceResponse {
    pub place: u64,
    pub total_families: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeagueResponse {
    pub league: League,
    pub threshold: Points,
    pub next_threshold: Option<Points>,
}

impl From<League> for LeagueResponse {
    fn from(league: League) -> Self {
        Self {
            league,
            threshold: league.threshold(),
            next_threshold: league.next().map(|next| next.threshold()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VoucherResponse {
    pub id: Voucher,
    pub title: String,
    pub description: String,
    pub merchant: String,
    pub category: VoucherCategory,
    pub cost: Points,
    pub value: u32,
    pub expiry_days: u32,
    pub affordable: bool,
}

impl VoucherResponse {
    pub fn new(voucher: Voucher, balance: Points) -> Self {
        Self {
            id: voucher,
            title: voucher.title().to_string(),
            description: voucher.description().to_string(),
            merchant: voucher.merchant().to_string(),
            category: voucher.category(),
            cost: voucher.cost(),
            value: voucher.value(),
            expiry_days: voucher.expiry_days(),
            affordable: voucher.missing_points(balance).is_none(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RedemptionResponse {
    pub id: Uuid,
    pub voucher: String,
    pub title: Option<String>,
    pub points_spent: Points,
    pub code: String,
    pub redeemed_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<RedemptionRecord> for RedemptionResponse {
    fn from(record: RedemptionRecord) -> Self {
        let voucher = record.voucher_id.parse::<Voucher>().ok();
        Self {
            id: record.id,
            title: voucher.map(|v| v.title().to_string()),
            expires_at: voucher.map(|v| {
                record.redeemed_at + chrono::Duration::days(v.expiry_days() as i64)
            }),
            voucher: record.voucher_id,
            points_spent: record.points_spent.max(0) as Points,
            code: record.code,
            redeemed_at: record.redeemed_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Statistics {
    pub families: u64,
    pub actions: u64,
    pub total_points: u64,
    pub achievements_awarded: u64,
    pub vouchers_redeemed: u64,
}

impl From<StatisticsRecord> for Statistics {
    fn from(record: StatisticsRecord) -> Self {
        Self {
            families: record.families.max(0) as u64,
            actions: record.actions.max(0) as u64,
            total_points: record.total_points.max(0) as u64,
            achievements_awarded: record.achievements.max(0) as u64,
            vouchers_redeemed: record.redemptions.max(0) as u64,
        }
    }
}
