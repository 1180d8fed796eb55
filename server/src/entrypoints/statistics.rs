use green_league_server::store::TrackerStore;
use rocket::{serde::json::Json, State};

use super::{types::Statistics, AppTracker};

#[utoipa::path(context_path = "/info", responses(
    (status = 200, description = "Get application statistics", body = Statistics)
))]
#[get("/")]
async fn get_statistics(tracker: &State<AppTracker>) -> Option<Json<Statistics>> {
    let statistics = match tracker.store().statistics().await {
        Err(e) => {
            tracing::error!("Failed to fetch statistics: {e}");
            return None;
        }
        Ok(value) => value,
    };
    Some(Json(statistics.into()))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount("/info", rocket::routes![get_statistics])
    })
}
