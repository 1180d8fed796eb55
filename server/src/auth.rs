use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use uuid::Uuid;

pub const DEFAULT_IDENTITY_HEADER: &str = "X-Family-Id";

/// Name of the header the upstream identity provider forwards the signed-in user id in.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_IDENTITY_HEADER.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum IdentityError {
    Missing,
    Malformed,
}

/// Family of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFamily(pub Uuid);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionFamily {
    type Error = IdentityError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = request
            .rocket()
            .state::<IdentityConfig>()
            .map(|config| config.header.as_str())
            .unwrap_or(DEFAULT_IDENTITY_HEADER);

        let Some(value) = request.headers().get_one(header) else {
            return Outcome::Error((Status::Unauthorized, IdentityError::Missing));
        };

        match Uuid::parse_str(value.trim()) {
            Ok(id) => Outcome::Success(Self(id)),
            Err(e) => {
                tracing::debug!("Rejected malformed identity header {header}: {e}");
                Outcome::Error((Status::Unauthorized, IdentityError::Malformed))
            }
        }
    }
}
