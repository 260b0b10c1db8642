//! Error types for dg-practice.

use crate::ids::IdError;

/// Result type for dg-practice operations.
pub type Result<T> = std::result::Result<T, PracticeError>;

/// Errors that can occur in dg-practice operations.
#[derive(Debug, thiserror::Error)]
pub enum PracticeError {
    /// Routine not found for the requesting user.
    #[error("routine not found: {routine_id}")]
    RoutineNotFound {
        /// The routine ID that was not found.
        routine_id: String,
    },

    /// Disc not found for the requesting user.
    #[error("disc not found: {disc_id}")]
    DiscNotFound {
        /// The disc ID that was not found.
        disc_id: String,
    },

    /// Session not found for the requesting user.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session ID that was not found.
        session_id: String,
    },

    /// Unknown practice mode.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Rejected input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

/// Input rejected at the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A hit or attempt count that is not a non-negative integer.
    #[error("invalid count for {field}: {value:?}")]
    InvalidCount {
        /// The form field name.
        field: String,
        /// The raw submitted value.
        value: String,
    },

    /// A routine without any usable station distance.
    #[error("routine needs at least one station distance greater than zero")]
    NoStations,

    /// A required text field was blank.
    #[error("{0} must not be empty")]
    Blank(&'static str),

    /// A malformed email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// A password below the minimum length.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
}
