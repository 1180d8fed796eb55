use green_league_server::{
    auth::SessionFamily,
    db::types::{NewProfile, ProfileUpdate},
    error::TrackerError,
    store::TrackerStore,
};
use rocket::{http::Status, serde::json::Json, State};

use super::{
    types::{CreateProfileRequest, ProfileResponse, UpdateProfileRequest},
    AppTracker,
};

#[utoipa::path(context_path = "/api", request_body = CreateProfileRequest, responses(
    (status = 201, description = "Create the profile of the signed-in family", body = ProfileResponse),
    (status = 400, description = "Invalid profile fields"),
    (status = 409, description = "Profile already exists")
))]
#[post("/profile", data = "<request>")]
async fn create_profile(
    family: SessionFamily,
    tracker: &State<AppTracker>,
    request: Json<CreateProfileRequest>,
) -> Result<(Status, Json<ProfileResponse>), TrackerError> {
    let request = request.into_inner();
    let profile = tracker
        .create_profile(NewProfile {
            id: family.0,
            family_name: request.family_name,
            email: request.email,
            member_count: request.member_count,
        })
        .await?;
    let place = tracker.store().leaderboard_place(family.0).await?;
    Ok((
        Status::Created,
        Json(ProfileResponse::new(profile, 0, place)),
    ))
}

#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Get the profile of the signed-in family", body = ProfileResponse),
    (status = 404, description = "Profile not found")
))]
#[get("/profile")]
async fn get_profile(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<Json<ProfileResponse>, TrackerError> {
    let overview = tracker.profile(family.0).await?;
    let place = tracker.store().leaderboard_place(family.0).await?;
    Ok(Json(ProfileResponse::new(
        overview.profile,
        overview.balance,
        place,
    )))
}

#[utoipa::path(context_path = "/api", request_body = UpdateProfileRequest, responses(
    (status = 200, description = "Update family name or member count", body = ProfileResponse),
    (status = 400, description = "Invalid profile fields"),
    (status = 404, description = "Profile not found")
))]
#[patch("/profile", data = "<request>")]
async fn update_profile(
    family: SessionFamily,
    tracker: &State<AppTracker>,
    request: Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, TrackerError> {
    let request = request.into_inner();
    tracker
        .update_profile(
            family.0,
            ProfileUpdate {
                family_name: request.family_name,
                member_count: request.member_count,
            },
        )
        .await?;
    get_profile(family, tracker).await
}

#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Mark the onboarding tutorial as completed", body = ProfileResponse),
    (status = 404, description = "Profile not found")
))]
#[post("/profile/tutorial")]
async fn complete_tutorial(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<Json<ProfileResponse>, TrackerError> {
    tracker.complete_tutorial(family.0).await?;
    get_profile(family, tracker).await
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing profile entrypoints", |rocket| async {
        rocket.mount(
            "/api",
            rocket::routes![create_profile, get_profile, update_profile, complete_tutorial],
        )
    })
}
