use green_league_server::{auth::SessionFamily, error::TrackerError};
use rocket::{serde::json::Json, State};
use shared::Analytics;

use super::AppTracker;

#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Get progress, streak and impact of the signed-in family", body = Analytics),
    (status = 404, description = "Profile not found")
))]
#[get("/analytics")]
async fn get_analytics(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<Json<Analytics>, TrackerError> {
    let today = chrono::Utc::now().date_naive();
    Ok(Json(tracker.analytics(family.0, today).await?))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing analytics entrypoints", |rocket| async {
        rocket.mount("/api", rocket::routes![get_analytics])
    })
}
