// handlers/mod.rs - two security tiers
//
// Public (no auth): /, /health, /signup, /signin
// Protected (JWT gate): /movies, /movies/:movieId, /review
pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::database::StoreError;
use crate::error::ApiError;

/// Parse a client-supplied document id; malformed ids are a client error
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} id.", what)))
}

/// Report a unique-constraint violation with a resource-specific message
pub(crate) fn duplicate_as(err: StoreError, message: &str) -> ApiError {
    match err {
        StoreError::Duplicate(what) => {
            tracing::warn!("Duplicate rejected ({}): {}", what, message);
            ApiError::conflict(message)
        }
        other => other.into(),
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
