use std::collections::HashMap;

use green_league_server::{auth::SessionFamily, store::TrackerStore};
use rocket::{serde::json::Json, State};
use shared::League;

use super::{
    types::{
        page_params, LeaderboardResponse, LeaguePopulation, LeagueResponse, PaginatedResponse,
        PlaceResponse,
    },
    AppTracker,
};

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Get families ranked by lifetime points", body = PaginatedLeaderboardResponse)
))]
#[get("/?<page>&<limit>")]
async fn get_leaderboard(
    tracker: &State<AppTracker>,
    page: Option<u64>,
    limit: Option<u64>,
) -> Option<Json<PaginatedResponse<LeaderboardResponse>>> {
    let (page, limit) = page_params(page, limit);
    let (records, total) = match tracker
        .store()
        .leaderboard(page as i64, limit as i64)
        .await
    {
        Err(e) => {
            tracing::error!("Failed to get leaderboard: {e}");
            return None;
        }
        Ok(value) => value,
    };
    Some(Json(PaginatedResponse::new(
        records.into_iter().map(Into::into).collect(),
        page + 1,
        limit,
        total,
    )))
}

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Get the amount of families in every league", body = [LeaguePopulation])
))]
#[get("/leagues")]
async fn get_league_populations(tracker: &State<AppTracker>) -> Option<Json<Vec<LeaguePopulation>>> {
    let counts = match tracker.store().league_counts().await {
        Err(e) => {
            tracing::error!("Failed to get league counts: {e}");
            return None;
        }
        Ok(value) => value,
    };
    let counts: HashMap<League, u64> = counts
        .into_iter()
        .filter_map(|record| {
            let league = record.league.parse::<League>().ok()?;
            Some((league, record.families.max(0) as u64))
        })
        .collect();

    Some(Json(
        League::all()
            .map(|league| LeaguePopulation {
                league,
                threshold: league.threshold(),
                families: counts.get(&league).copied().unwrap_or_default(),
            })
            .collect(),
    ))
}

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Get the place of the signed-in family", body = PlaceResponse),
    (status = 404, description = "Profile not found")
))]
#[get("/place")]
async fn get_place(family: SessionFamily, tracker: &State<AppTracker>) -> Option<Json<PlaceResponse>> {
    let place = match tracker.store().leaderboard_place(family.0).await {
        Err(e) => {
            tracing::error!("Failed to get leaderboard place of {}: {e}", family.0);
            return None;
        }
        Ok(value) => value?,
    };
    let total_families = match tracker.store().statistics().await {
        Err(e) => {
            tracing::error!("Failed to count families: {e}");
            return None;
        }
        Ok(value) => value.families.max(0) as u64,
    };
    Some(Json(PlaceResponse {
        place: place.max(0) as u64,
        total_families,
    }))
}

#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Get the league ladder with point thresholds", body = [LeagueResponse])
))]
#[get("/leagues")]
async fn get_leagues() -> Json<Vec<LeagueResponse>> {
    Json(League::all().map(Into::into).collect())
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing leaderboard entrypoints", |rocket| async {
        rocket
            .mount(
                "/api/leaderboard",
                rocket::routes![get_leaderboard, get_league_populations, get_place],
            )
            .mount("/api", rocket::routes![get_leagues])
    })
}
