use std::collections::HashSet;

use rand::{distributions::Alphanumeric, Rng};
use rocket::{fairing::AdHoc, Build, Rocket};
use shared::{
    newly_eligible, ActionEntry, Analytics, AwardPolicy, Points, ProgressSnapshot, Promotion,
    Voucher, ACHIEVEMENTS,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::types::{
        ActionRecord, AwardRecord, NewAction, NewProfile, ProfileRecord, ProfileUpdate,
        RedeemOutcome, RedemptionRecord,
    },
    error::TrackerError,
    metrics::TrackerMetrics,
    store::TrackerStore,
};

pub const MAX_MEMBER_COUNT: u32 = 50;
pub const MAX_FAMILY_NAME_LEN: usize = 100;
pub const REDEMPTION_CODE_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub action: ActionRecord,
    pub profile: ProfileRecord,
    pub promotion: Option<Promotion>,
    pub awarded: Vec<AwardRecord>,
    pub achievements: Vec<AwardRecord>,
}

#[derive(Debug, Clone)]
pub struct AchievementCheck {
    pub awarded: Vec<AwardRecord>,
    pub achievements: Vec<AwardRecord>,
}

#[derive(Debug, Clone)]
pub struct ProfileOverview {
    pub profile: ProfileRecord,
    pub balance: Points,
}

/// Applies green actions, league promotions, achievement awards and redemptions for a family.
pub struct Tracker<S> {
    store: S,
    policy: AwardPolicy,
    metrics: TrackerMetrics,
}

impl<S: TrackerStore> Tracker<S> {
    pub fn new(store: S, policy: AwardPolicy, metrics: TrackerMetrics) -> Self {
        Self {
            store,
            policy,
            metrics,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, family: Uuid) -> Result<ProfileOverview, TrackerError> {
        let profile = self
            .store
            .profile(family)
            .await?
            .ok_or(TrackerError::ProfileNotFound)?;
        let balance = self.balance(&profile).await?;
        Ok(ProfileOverview { profile, balance })
    }

    #[instrument(skip(self))]
    pub async fn create_profile(&self, profile: NewProfile) -> Result<ProfileRecord, TrackerError> {
        let profile = NewProfile {
            id: profile.id,
            family_name: validate_family_name(&profile.family_name)?,
            email: validate_email(&profile.email)?,
            member_count: validate_member_count(profile.member_count)?,
        };

        let created = self
            .store
            .create_profile(&profile)
            .await?
            .ok_or(TrackerError::ProfileExists)?;
        tracing::info!("New family joined: {}", created.family_name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        family: Uuid,
        update: ProfileUpdate,
    ) -> Result<ProfileRecord, TrackerError> {
        let update = ProfileUpdate {
            family_name: update
                .family_name
                .as_deref()
                .map(validate_family_name)
                .transpose()?,
            member_count: update
                .member_count
                .map(validate_member_count)
                .transpose()?,
        };

        Ok(self
            .store
            .update_profile(family, &update)
            .await?
            .ok_or(TrackerError::ProfileNotFound)?)
    }

    #[instrument(skip(self))]
    pub async fn complete_tutorial(&self, family: Uuid) -> Result<ProfileRecord, TrackerError> {
        Ok(self
            .store
            .complete_tutorial(family)
            .await?
            .ok_or(TrackerError::ProfileNotFound)?)
    }

    /// Records the action, moves the family up the ladder if needed and awards achievements.
    #[instrument(skip(self))]
    pub async fn record_action(
        &self,
        family: Uuid,
        action: NewAction,
    ) -> Result<ActionOutcome, TrackerError> {
        let photo_url = action
            .photo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if action.kind.requires_photo() && photo_url.is_none() {
            return Err(TrackerError::PhotoRequired(action.kind));
        }
        let action = NewAction {
            kind: action.kind,
            photo_url,
        };

        let applied = self
            .store
            .append_action(family, &action)
            .await?
            .ok_or(TrackerError::ProfileNotFound)?;
        self.metrics.action_recorded(&action.kind.to_string());

        let promotion = applied.change.promotion();
        if let Some(promotion) = promotion {
            tracing::info!(
                "{} promoted from {} to {}",
                applied.profile.family_name,
                promotion.from,
                promotion.to
            );
            self.metrics.promoted(&promotion.to.to_string());
        }

        // The action is already stored, award failures are reported but don't fail the request.
        let check = match self.award_eligible(family, &applied.profile).await {
            Ok(check) => check,
            Err(e) => {
                tracing::error!("Failed to award achievements for {family}: {e:#}");
                AchievementCheck {
                    awarded: vec![],
                    achievements: vec![],
                }
            }
        };

        Ok(ActionOutcome {
            action: applied.action,
            profile: applied.profile,
            promotion,
            awarded: check.awarded,
            achievements: check.achievements,
        })
    }

    /// Re-runs the eligibility scan. Already earned achievements are never awarded twice.
    #[instrument(skip(self))]
    pub async fn check_achievements(&self, family: Uuid) -> Result<AchievementCheck, TrackerError> {
        let profile = self
            .store
            .profile(family)
            .await?
            .ok_or(TrackerError::ProfileNotFound)?;
        Ok(self.award_eligible(family, &profile).await?)
    }

    async fn award_eligible(
        &self,
        family: Uuid,
        profile: &ProfileRecord,
    ) -> anyhow::Result<AchievementCheck> {
        let actions_count = self.store.action_count(family).await?;
        let snapshot = ProgressSnapshot::new(
            profile.points(),
            u32::try_from(actions_count).unwrap_or(u32::MAX),
        );

        let mut achievements = self.store.awards(family).await?;
        let earned: HashSet<_> = achievements
            .iter()
            .filter_map(|a| u32::try_from(a.achievement_id).ok())
            .collect();

        let mut awarded = Vec::new();
        for achievement in newly_eligible(&ACHIEVEMENTS, &snapshot, &earned, self.policy) {
            // A concurrent check may have stored it first.
            if let Some(award) = self.store.insert_award(family, achievement).await? {
                tracing::info!(
                    "{} earned achievement {}",
                    profile.family_name,
                    achievement.name
                );
                self.metrics.achievement_awarded(achievement.name);
                awarded.push(award);
            }
        }

        if !awarded.is_empty() {
            achievements = self.store.awards(family).await?;
        }

        Ok(AchievementCheck {
            awarded,
            achievements,
        })
    }

    pub async fn achievements(&self, family: Uuid) -> Result<Vec<AwardRecord>, TrackerError> {
        Ok(self.store.awards(family).await?)
    }

    pub async fn balance(&self, profile: &ProfileRecord) -> anyhow::Result<Points> {
        let spent = self.store.spent_points(profile.id).await?;
        Ok(profile.points().saturating_sub(spent))
    }

    #[instrument(skip(self))]
    pub async fn redeem(
        &self,
        family: Uuid,
        voucher: Voucher,
    ) -> Result<RedemptionRecord, TrackerError> {
        let code = redemption_code();
        match self.store.redeem(family, voucher, &code).await? {
            RedeemOutcome::Redeemed(record) => {
                tracing::info!("{family} redeemed voucher {voucher}");
                self.metrics.voucher_redeemed(&voucher.to_string());
                Ok(record)
            }
            RedeemOutcome::Insufficient { missing } => {
                Err(TrackerError::InsufficientPoints { missing })
            }
            RedeemOutcome::ProfileNotFound => Err(TrackerError::ProfileNotFound),
        }
    }

    #[instrument(skip(self))]
    pub async fn analytics(
        &self,
        family: Uuid,
        today: chrono::NaiveDate,
    ) -> Result<Analytics, TrackerError> {
        let profile = self
            .store
            .profile(family)
            .await?
            .ok_or(TrackerError::ProfileNotFound)?;
        let entries: Vec<ActionEntry> = self
            .store
            .all_actions(family)
            .await?
            .into_iter()
            .filter_map(|record| {
                let Some(kind) = record.kind() else {
                    tracing::warn!(
                        "Skipping action {} with unknown kind `{}`",
                        record.id,
                        record.action_id
                    );
                    return None;
                };
                Some(ActionEntry {
                    kind,
                    points: record.points_earned.max(0) as Points,
                    completed_at: record.completed_at,
                })
            })
            .collect();
        Ok(Analytics::build(profile.points(), &entries, today))
    }
}

/// Attaches the store fairings and then manages a `Tracker` over the store they set up.
///
/// Fairings attached from `on_ignite` only run in the next ignite batch, so the tracker
/// fairing is attached in the same batch as the store fairings, right after them.
pub fn stage<S, A, F>(
    attach_store: A,
    fetch_store: F,
    policy: AwardPolicy,
    metrics: TrackerMetrics,
) -> AdHoc
where
    S: TrackerStore + 'static,
    A: FnOnce(Rocket<Build>) -> Rocket<Build> + Send + 'static,
    F: FnOnce(&Rocket<Build>) -> Option<S> + Send + 'static,
{
    AdHoc::on_ignite("Tracker Stage", move |rocket| async move {
        attach_store(rocket).attach(AdHoc::try_on_ignite("Tracker", move |rocket| async move {
            let Some(store) = fetch_store(&rocket) else {
                tracing::error!("Tracker store is not configured");
                return Err(rocket);
            };
            tracing::info!("Tracker ready, award policy {policy:?}");
            Ok(rocket.manage(Tracker::new(store, policy, metrics)))
        }))
    })
}

fn redemption_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REDEMPTION_CODE_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

fn validate_family_name(name: &str) -> Result<String, TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::Validation("Family name is required".into()));
    }
    if name.chars().count() > MAX_FAMILY_NAME_LEN {
        return Err(TrackerError::Validation(format!(
            "Family name must be at most {MAX_FAMILY_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, TrackerError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(TrackerError::Validation("A valid email is required".into())),
    }
}

fn validate_member_count(count: u32) -> Result<u32, TrackerError> {
    if (1..=MAX_MEMBER_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(TrackerError::Validation(format!(
            "Member count must be between 1 and {MAX_MEMBER_COUNT}"
        )))
    }
}
