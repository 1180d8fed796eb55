use std::collections::HashMap;

use green_league_server::{auth::SessionFamily, error::TrackerError};
use rocket::{serde::json::Json, State};
use shared::ACHIEVEMENTS;

use super::{
    types::{AchievementCheckResponse, AchievementResponse},
    AppTracker,
};

#[utoipa::path(context_path = "/api/achievements", responses(
    (status = 200, description = "Get every achievement with the signed-in family's earn date", body = [AchievementResponse])
))]
#[get("/")]
async fn get_achievements(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<Json<Vec<AchievementResponse>>, TrackerError> {
    let earned: HashMap<_, _> = tracker
        .achievements(family.0)
        .await?
        .into_iter()
        .map(|award| (award.achievement_id, award.earned_at))
        .collect();

    Ok(Json(
        ACHIEVEMENTS
            .iter()
            .map(|a| AchievementResponse {
                id: a.id,
                name: a.name.to_string(),
                description: a.description.to_string(),
                icon: a.icon.to_string(),
                requirement: AchievementResponse::requirement_text(&a.requirement),
                points_reward: a.points_reward,
                earned_at: earned.get(&(a.id as i32)).copied(),
            })
            .collect(),
    ))
}

#[utoipa::path(context_path = "/api/achievements", responses(
    (status = 200, description = "Award achievements the family became eligible for", body = AchievementCheckResponse),
    (status = 404, description = "Profile not found")
))]
#[post("/check")]
async fn check_achievements(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<Json<AchievementCheckResponse>, TrackerError> {
    Ok(Json(tracker.check_achievements(family.0).await?.into()))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing achievement entrypoints", |rocket| async {
        rocket.mount(
            "/api/achievements",
            rocket::routes![get_achievements, check_achievements],
        )
    })
}
