use green_league_server::{auth::SessionFamily, error::TrackerError, store::TrackerStore};
use rocket::{http::Status, serde::json::Json, State};
use shared::{IntoEnumIterator, Voucher};

use super::{
    types::{RedemptionResponse, VoucherResponse},
    AppTracker,
};

#[utoipa::path(context_path = "/api/vouchers", responses(
    (status = 200, description = "Get partner vouchers and whether the family can afford them", body = [VoucherResponse]),
    (status = 404, description = "Profile not found")
))]
#[get("/")]
async fn get_vouchers(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<Json<Vec<VoucherResponse>>, TrackerError> {
    let balance = tracker.profile(family.0).await?.balance;
    Ok(Json(
        Voucher::iter()
            .map(|voucher| VoucherResponse::new(voucher, balance))
            .collect(),
    ))
}

#[utoipa::path(context_path = "/api/vouchers", responses(
    (status = 201, description = "Spend points on a voucher", body = RedemptionResponse),
    (status = 402, description = "Not enough points"),
    (status = 404, description = "Unknown voucher or profile")
))]
#[post("/<id>/redeem")]
async fn redeem_voucher(
    id: &str,
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Result<(Status, Json<RedemptionResponse>), TrackerError> {
    let voucher = id
        .parse::<Voucher>()
        .map_err(|_| TrackerError::UnknownVoucher(id.to_string()))?;
    let record = tracker.redeem(family.0, voucher).await?;
    Ok((Status::Created, Json(record.into())))
}

#[utoipa::path(context_path = "/api/vouchers", responses(
    (status = 200, description = "Get redeemed vouchers of the signed-in family, newest first", body = [RedemptionResponse])
))]
#[get("/redemptions")]
async fn get_redemptions(
    family: SessionFamily,
    tracker: &State<AppTracker>,
) -> Option<Json<Vec<RedemptionResponse>>> {
    let records = match tracker.store().redemptions(family.0).await {
        Err(e) => {
            tracing::error!("Failed to get redemptions of {}: {e}", family.0);
            return None;
        }
        Ok(value) => value,
    };
    Some(Json(records.into_iter().map(Into::into).collect()))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing voucher entrypoints", |rocket| async {
        rocket.mount(
            "/api/vouchers",
            rocket::routes![get_vouchers, redeem_voucher, get_redemptions],
        )
    })
}
