use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use shared::{GreenAction, Points};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Unknown voucher `{0}`")]
    UnknownVoucher(String),

    #[error("Profile already exists")]
    ProfileExists,

    #[error("Action `{0}` requires photo proof")]
    PhotoRequired(GreenAction),

    #[error("Insufficient points: {missing} more points needed")]
    InsufficientPoints { missing: Points },

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn status(&self) -> Status {
        match self {
            Self::ProfileNotFound | Self::UnknownVoucher(_) => Status::NotFound,
            Self::ProfileExists => Status::Conflict,
            Self::PhotoRequired(_) => Status::UnprocessableEntity,
            Self::InsufficientPoints { .. } => Status::PaymentRequired,
            Self::Validation(_) => Status::BadRequest,
            Self::Internal(_) => Status::InternalServerError,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl<'r> Responder<'r, 'static> for TrackerError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let error = match &self {
            Self::Internal(e) => {
                tracing::error!("Request {} failed: {e:#}", request.uri());
                "Internal error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(ErrorBody { error })).respond_to(request)
    }
}
