use alloy_primitives::Address;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const CALLER_HEADER: &str = "X-Caller-Address";

/// Address the request acts on behalf of.
///
/// Ownership checks happen in the registry; this only parses the header.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Address);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<Address>().ok())
            .map(Caller)
            .ok_or(AppError::MissingCaller)
    }
}
