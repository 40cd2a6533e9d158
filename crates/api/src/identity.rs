//! Caller identity taken from the `X-User-ID` header.
//!
//! The header is trusted as-is; authentication happens outside this service.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use qynnovel_types::UserId;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The calling user's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub UserId);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(ApiError::MissingIdentity)?;

        let raw = value
            .to_str()
            .map_err(|_| ApiError::InvalidIdentity("not valid text".to_string()))?;

        raw.trim()
            .parse::<i64>()
            .map(|id| CallerId(UserId(id)))
            .map_err(|_| ApiError::InvalidIdentity(raw.to_string()))
    }
}
