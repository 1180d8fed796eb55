use green_league_server::{
    auth::SessionFamily, db::types::NewAction, error::TrackerError, store::TrackerStore,
};
use rocket::{http::Status, serde::json::Json, State};
use shared::{GreenAction, IntoEnumIterator};

use super::{
    types::{
        page_params, ActionCatalogEntry, ActionResponse, PaginatedResponse, RecordActionRequest,
        RecordActionResponse,
    },
    AppTracker,
};

#[utoipa::path(context_path = "/api/actions", responses(
    (status = 200, description = "Get the catalog of green actions", body = [ActionCatalogEntry])
))]
#[get("/catalog")]
async fn get_catalog() -> Json<Vec<ActionCatalogEntry>> {
    Json(GreenAction::iter().map(Into::into).collect())
}

#[utoipa::path(context_path = "/api/actions", responses(
    (status = 200, description = "Get recorded actions of the signed-in family, newest first", body = PaginatedActionResponse)
))]
#[get("/?<page>&<limit>")]
async fn get_actions(
    family: SessionFamily,
    tracker: &State<AppTracker>,
    page: Option<u64>,
    limit: Option<u64>,
) -> Option<Json<PaginatedResponse<ActionResponse>>> {
    let (page, limit) = page_params(page, limit);
    let (records, total) = match tracker
        .store()
        .actions(family.0, page as i64, limit as i64)
        .await
    {
        Err(e) => {
            tracing::error!("Failed to get actions of {}: {e}", family.0);
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

#[utoipa::path(context_path = "/api/actions", request_body = RecordActionRequest, responses(
    (status = 201, description = "Record a green action and apply its points", body = RecordActionResponse),
    (status = 404, description = "Profile not found"),
    (status = 422, description = "Photo proof is missing")
))]
#[post("/", data = "<request>")]
async fn record_action(
    family: SessionFamily,
    tracker: &State<AppTracker>,
    request: Json<RecordActionRequest>,
) -> Result<(Status, Json<RecordActionResponse>), TrackerError> {
    let request = request.into_inner();
    let outcome = tracker
        .record_action(
            family.0,
            NewAction {
                kind: request.action,
                photo_url: request.photo_url,
            },
        )
        .await?;
    Ok((Status::Created, Json(outcome.into())))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing action entrypoints", |rocket| async {
        rocket.mount(
            "/api/actions",
            rocket::routes![get_catalog, get_actions, record_action],
        )
    })
}
