use chrono::Utc;
use rocket::{error::ErrorKind, fairing::AdHoc, Build, Rocket};
use shared::{AwardPolicy, GreenAction, League, Points, Voucher};
use uuid::Uuid;

use crate::{
    db::types::{ActionRecord, NewAction, NewProfile, ProfileUpdate},
    error::TrackerError,
    metrics::TrackerMetrics,
    mock::MemoryStore,
    store::TrackerStore,
    tracker::{self, ActionOutcome, Tracker},
};

pub fn new_profile(id: Uuid) -> NewProfile {
    NewProfile {
        id,
        family_name: "The Greens".to_string(),
        email: "greens@example.com".to_string(),
        member_count: 4,
    }
}

pub fn with_photo(kind: GreenAction) -> NewAction {
    NewAction {
        kind,
        photo_url: Some(format!("https://photos.example.com/{kind}.jpg")),
    }
}

pub struct TrackerExt {
    pub tracker: Tracker<MemoryStore>,
    pub metrics: TrackerMetrics,
    pub family: Uuid,
}

impl TrackerExt {
    pub async fn new() -> Self {
        Self::with(MemoryStore::default(), AwardPolicy::AllEligible).await
    }

    pub async fn with(store: MemoryStore, policy: AwardPolicy) -> Self {
        let metrics = TrackerMetrics::new().unwrap();
        let tracker = Tracker::new(store, policy, metrics.clone());
        let family = Uuid::new_v4();
        tracker.create_profile(new_profile(family)).await.unwrap();
        Self {
            tracker,
            metrics,
            family,
        }
    }

    pub async fn record(&self, kind: GreenAction) -> ActionOutcome {
        self.tracker
            .record_action(self.family, with_photo(kind))
            .await
            .unwrap()
    }

    pub fn set_points(&self, points: Points) {
        self.tracker.store().set_points(self.family, points);
    }

    pub async fn points(&self) -> Points {
        self.tracker.profile(self.family).await.unwrap().profile.points()
    }

    pub async fn awarded_names(&self) -> Vec<String> {
        let check = self.tracker.check_achievements(self.family).await.unwrap();
        check
            .awarded
            .into_iter()
            .map(|a| a.achievement_name)
            .collect()
    }
}

#[rocket::async_test]
async fn new_profile_starts_in_bronze() {
    let ext = TrackerExt::new().await;
    let overview = ext.tracker.profile(ext.family).await.unwrap();

    assert_eq!(overview.profile.points(), 0);
    assert_eq!(overview.profile.league, League::Bronze.to_string());
    assert_eq!(overview.balance, 0);
    assert!(!overview.profile.tutorial_completed);
}

#[rocket::async_test]
async fn duplicate_profile_is_rejected() {
    let ext = TrackerExt::new().await;
    let err = ext
        .tracker
        .create_profile(new_profile(ext.family))
        .await
        .err()
        .expect("ignite should fail without a store");
    assert!(matches!(err, TrackerError::ProfileExists));
}

#[rocket::async_test]
async fn invalid_profile_fields_are_rejected() {
    let ext = TrackerExt::new().await;
    let cases = [
        NewProfile {
            family_name: "   ".to_string(),
            ..new_profile(Uuid::new_v4())
        },
        NewProfile {
            email: "not-an-email".to_string(),
            ..new_profile(Uuid::new_v4())
        },
        NewProfile {
            member_count: 0,
            ..new_profile(Uuid::new_v4())
        },
        NewProfile {
            member_count: 51,
            ..new_profile(Uuid::new_v4())
        },
    ];

    for profile in cases {
        let err = ext.tracker.create_profile(profile).await.unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)), "{err}");
    }
}

#[rocket::async_test]
async fn profile_update_and_tutorial() {
    let ext = TrackerExt::new().await;
    let updated = ext
        .tracker
        .update_profile(
            ext.family,
            ProfileUpdate {
                family_name: Some("  The Evergreens ".to_string()),
                member_count: Some(5),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.family_name, "The Evergreens");
    assert_eq!(updated.member_count, 5);

    let err = ext
        .tracker
        .update_profile(
            ext.family,
            ProfileUpdate {
                member_count: Some(0),
                ..Default::default()
            },
        )
        .await
        .err()
        .expect("ignite should fail without a store");
    assert!(matches!(err, TrackerError::Validation(_)));

    let profile = ext.tracker.complete_tutorial(ext.family).await.unwrap();
    assert!(profile.tutorial_completed);
}

#[rocket::async_test]
async fn action_crossing_threshold_promotes() {
    let ext = TrackerExt::new().await;
    ext.set_points(95);

    let outcome = ext.record(GreenAction::WaterReuse).await;

    assert_eq!(outcome.action.points_earned, 10);
    assert_eq!(outcome.profile.points(), 105);
    assert_eq!(outcome.profile.league, League::Silver.to_string());
    let promotion = outcome.promotion.unwrap();
    assert_eq!(promotion.from, League::Bronze);
    assert_eq!(promotion.to, League::Silver);
}

#[rocket::async_test]
async fn action_within_league_does_not_promote() {
    let ext = TrackerExt::new().await;
    ext.set_points(120);

    let outcome = ext.record(GreenAction::Recycle).await;

    assert_eq!(outcome.profile.points(), 125);
    assert_eq!(outcome.profile.league, League::Silver.to_string());
    assert!(outcome.promotion.is_none());
}

#[rocket::async_test]
async fn top_league_never_promotes() {
    let ext = TrackerExt::new().await;
    ext.set_points(2000);

    let outcome = ext.record(GreenAction::Plant).await;

    assert_eq!(outcome.profile.points(), 2020);
    assert_eq!(outcome.profile.league, League::Wisdom.to_string());
    assert!(outcome.promotion.is_none());
}

#[rocket::async_test]
async fn missing_photo_is_rejected_without_side_effects() {
    let ext = TrackerExt::new().await;

    for photo_url in [None, Some("   ".to_string())] {
        let err = ext
            .tracker
            .record_action(
                ext.family,
                NewAction {
                    kind: GreenAction::Donate,
                    photo_url,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::PhotoRequired(GreenAction::Donate)));
    }

    assert_eq!(ext.points().await, 0);
    assert_eq!(
        ext.tracker.store().action_count(ext.family).await.unwrap(),
        0
    );
    assert_eq!(ext.metrics.actions_count("donate"), 0);
}

#[rocket::async_test]
async fn first_action_awards_first_steps_once() {
    let ext = TrackerExt::new().await;

    let first = ext.record(GreenAction::Recycle).await;
    let names: Vec<_> = first.awarded.iter().map(|a| a.achievement_name.as_str()).collect();
    assert_eq!(names, vec!["First Steps"]);
    assert_eq!(first.achievements.len(), 1);

    let second = ext.record(GreenAction::Recycle).await;
    assert!(second.awarded.is_empty());
    assert_eq!(second.achievements.len(), 1);
    assert_eq!(ext.metrics.actions_count("recycle"), 2);
}

#[rocket::async_test]
async fn repeated_check_never_duplicates() {
    let ext = TrackerExt::new().await;
    ext.set_points(100);

    let mut first = ext.awarded_names().await;
    first.sort();
    assert_eq!(first, vec!["League Climber", "Point Master"]);

    assert!(ext.awarded_names().await.is_empty());
    assert_eq!(ext.tracker.achievements(ext.family).await.unwrap().len(), 2);
}

#[rocket::async_test]
async fn first_match_awards_one_per_check() {
    let ext = TrackerExt::with(MemoryStore::default(), AwardPolicy::FirstMatch).await;
    ext.set_points(100);

    assert_eq!(ext.awarded_names().await, vec!["League Climber"]);
    assert_eq!(ext.awarded_names().await, vec!["Point Master"]);
    assert!(ext.awarded_names().await.is_empty());
}

#[rocket::async_test]
async fn award_failure_keeps_the_action() {
    let ext = TrackerExt::with(MemoryStore::failing_awards(), AwardPolicy::AllEligible).await;

    let outcome = ext.record(GreenAction::Plant).await;

    assert!(outcome.awarded.is_empty());
    assert_eq!(outcome.profile.points(), 20);
    assert_eq!(ext.points().await, 20);
}

#[rocket::async_test]
async fn redemption_requires_enough_balance() {
    let ext = TrackerExt::new().await;
    ext.set_points(150);

    let err = ext
        .tracker
        .redeem(ext.family, Voucher::WholeFoods)
        .await
        .err()
        .expect("ignite should fail without a store");
    assert!(matches!(
        err,
        TrackerError::InsufficientPoints { missing: 50 }
    ));
    assert!(ext
        .tracker
        .store()
        .redemptions(ext.family)
        .await
        .unwrap()
        .is_empty());
}

#[rocket::async_test]
async fn redemption_spends_balance_but_keeps_league() {
    let ext = TrackerExt::new().await;
    ext.set_points(250);

    let record = ext
        .tracker
        .redeem(ext.family, Voucher::WholeFoods)
        .await
        .unwrap();
    assert_eq!(record.points_spent, 200);
    assert_eq!(record.voucher_id, "v1");
    assert_eq!(record.code.len(), 10);
    assert!(record.code.chars().all(|c| c.is_ascii_alphanumeric()));

    let overview = ext.tracker.profile(ext.family).await.unwrap();
    assert_eq!(overview.balance, 50);
    assert_eq!(overview.profile.points(), 250);
    assert_eq!(overview.profile.league, League::Gold.to_string());

    let err = ext
        .tracker
        .redeem(ext.family, Voucher::EcoStore)
        .await
        .err()
        .expect("ignite should fail without a store");
    assert!(matches!(
        err,
        TrackerError::InsufficientPoints { missing: 100 }
    ));
}

#[rocket::async_test]
async fn unknown_family_is_not_found() {
    let ext = TrackerExt::new().await;
    let stranger = Uuid::new_v4();

    let err = ext
        .tracker
        .record_action(stranger, with_photo(GreenAction::Recycle))
        .await
        .err()
        .expect("ignite should fail without a store");
    assert!(matches!(err, TrackerError::ProfileNotFound));

    let err = ext
        .tracker
        .redeem(stranger, Voucher::EcoStore)
        .await
        .err()
        .expect("ignite should fail without a store");
    assert!(matches!(err, TrackerError::ProfileNotFound));

    let err = ext.tracker.check_achievements(stranger).await.unwrap_err();
    assert!(matches!(err, TrackerError::ProfileNotFound));

    let err = ext.tracker.profile(stranger).await.unwrap_err();
    assert!(matches!(err, TrackerError::ProfileNotFound));
}

#[rocket::async_test]
async fn analytics_reflect_recorded_actions() {
    let ext = TrackerExt::new().await;
    ext.record(GreenAction::WaterReuse).await;
    ext.record(GreenAction::Plant).await;

    let today = chrono::Utc::now().date_naive();
    let analytics = ext.tracker.analytics(ext.family, today).await.unwrap();

    assert_eq!(analytics.total_actions, 2);
    assert_eq!(analytics.total_points, 30);
    assert_eq!(analytics.average_points_per_action, 15.0);
    assert_eq!(analytics.streak.current, 1);
}

#[rocket::async_test]
async fn action_history_is_newest_first() {
    let ext = TrackerExt::new().await;
    ext.record(GreenAction::Recycle).await;
    ext.record(GreenAction::Donate).await;
    ext.record(GreenAction::Plant).await;

    let (page, total) = ext.tracker.store().actions(ext.family, 0, 2).await.unwrap();
    assert_eq!(total, 3);
    let kinds: Vec<_> = page.iter().filter_map(|a| a.kind()).collect();
    assert_eq!(kinds, vec![GreenAction::Plant, GreenAction::Donate]);

    let (page, _) = ext.tracker.store().actions(ext.family, 1, 2).await.unwrap();
    assert_eq!(page[0].kind(), Some(GreenAction::Recycle));
}

#[rocket::async_test]
async fn awards_are_listed_newest_first() {
    let ext = TrackerExt::new().await;
    ext.record(GreenAction::Recycle).await;
    ext.set_points(100);
    assert_eq!(ext.awarded_names().await.len(), 2);

    let names: Vec<_> = ext
        .tracker
        .achievements(ext.family)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.achievement_name)
        .collect();
    assert_eq!(names.len(), 3);
    assert_eq!(names.last().map(String::as_str), Some("First Steps"));
}

#[rocket::async_test]
async fn pages_far_past_the_end_are_empty() {
    let ext = TrackerExt::new().await;
    ext.record(GreenAction::Recycle).await;
    let store = ext.tracker.store();

    let (page, total) = store.actions(ext.family, i64::MAX, 100).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(total, 1);

    let (page, total) = store.leaderboard(1 << 60, 100).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(total, 1);
}

#[rocket::async_test]
async fn analytics_skip_unknown_action_kinds() {
    let ext = TrackerExt::new().await;
    ext.record(GreenAction::Plant).await;
    ext.tracker.store().push_action(ActionRecord {
        id: Uuid::new_v4(),
        profile_id: ext.family,
        action_id: "retired-action".to_string(),
        action_title: "Retired action".to_string(),
        points_earned: 5,
        photo_url: None,
        completed_at: Utc::now(),
    });

    let today = Utc::now().date_naive();
    let analytics = ext.tracker.analytics(ext.family, today).await.unwrap();

    assert_eq!(analytics.total_actions, 1);
    assert_eq!(analytics.breakdown.len(), 1);
    assert_eq!(analytics.breakdown[0].action, GreenAction::Plant);
    assert!(!analytics.weekly_streak);
}

struct StoreReady;

fn attach_memory_store(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.attach(AdHoc::on_ignite("Memory Store", |rocket| async {
        rocket.manage(StoreReady)
    }))
}

#[rocket::async_test]
async fn tracker_stage_sees_store_set_up_during_ignite() {
    let rocket = rocket::build()
        .attach(tracker::stage(
            attach_memory_store,
            |rocket: &Rocket<Build>| rocket.state::<StoreReady>().map(|_| MemoryStore::default()),
            AwardPolicy::AllEligible,
            TrackerMetrics::new().unwrap(),
        ))
        .ignite()
        .await
        .unwrap();

    assert!(rocket.state::<Tracker<MemoryStore>>().is_some());
}

#[rocket::async_test]
async fn tracker_stage_fails_ignite_without_store() {
    let err = rocket::build()
        .attach(tracker::stage(
            |rocket| rocket,
            |_: &Rocket<Build>| None::<MemoryStore>,
            AwardPolicy::AllEligible,
            TrackerMetrics::new().unwrap(),
        ))
        .ignite()
        .await
        .err()
        .expect("ignite should fail without a store");

    assert!(matches!(err.kind(), ErrorKind::FailedFairings(_)));
}
