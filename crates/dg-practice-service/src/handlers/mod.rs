//! API handlers.

pub mod discs;
pub mod health;
pub mod home;
pub mod identity;
pub mod manufacturers;
pub mod routines;
pub mod sessions;
pub mod stats;
pub mod users;

use std::str::FromStr;

use crate::error::ApiError;

/// Parse a path ID. An unparseable ID is reported like a missing record.
pub(crate) fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(entity, raw))
}
