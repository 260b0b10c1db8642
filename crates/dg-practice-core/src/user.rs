//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::UserId;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered user.
///
/// Usernames and emails are unique case-insensitively. Users are never
/// hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID.
    pub id: UserId,

    /// Login name, stored as entered.
    pub username: String,

    /// Email address, stored as entered.
    pub email: String,

    /// Password hash in PHC string format.
    pub password_hash: String,

    /// When the user registered.
    pub created_at: DateTime<Utc>,

    /// When the profile was last edited.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user after validating the username and email.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a blank username or malformed email.
    pub fn new(
        username: &str,
        email: &str,
        password_hash: String,
    ) -> Result<Self, ValidationError> {
        let now = Utc::now();
        Ok(Self {
            id: UserId::generate(),
            username: validate_username(username)?,
            email: validate_email(email)?,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether `login` names this user by username or email (case-insensitive).
    #[must_use]
    pub fn matches_login(&self, login: &str) -> bool {
        let login = normalize_key(login);
        normalize_key(&self.username) == login || normalize_key(&self.email) == login
    }

    /// Whether this user and `other` would collide on username or email.
    #[must_use]
    pub fn conflicts_with(&self, other: &User) -> bool {
        self.id != other.id
            && (normalize_key(&self.username) == normalize_key(&other.username)
                || normalize_key(&self.email) == normalize_key(&other.email))
    }
}

/// Case-insensitive comparison key for usernames and emails.
#[must_use]
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trim and validate a username.
///
/// # Errors
///
/// Returns `ValidationError::Blank` for a blank username.
pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::Blank("username"));
    }
    Ok(username.to_string())
}

/// Trim and validate an email address.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` unless the address has a non-empty
/// local part and domain around a single `@`.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email.to_string())
        }
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

/// Check the password length policy.
///
/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` below [`MIN_PASSWORD_LEN`] characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}
