//! Identifiers.
//!
//! Users, discs and routines are keyed by random UUIDs, as in the legacy
//! document. Sessions use ULIDs so the ledger sorts in recording order.
//!
//! Every identifier is stored and sent as its plain string form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Declares a string-serialized identifier newtype over `$inner`.
///
/// `$generate` creates a fresh value and `$parse` reads the textual form,
/// failing with `$error`.
macro_rules! id_type {
    ($name:ident, $inner:ty, $generate:expr, $parse:expr, $error:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name($inner);

        impl $name {
            /// A fresh identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self($generate)
            }

            /// Wrap an existing value.
            #[must_use]
            pub const fn from_inner(inner: $inner) -> Self {
                Self(inner)
            }

            /// The wrapped value.
            #[must_use]
            pub const fn inner(&self) -> &$inner {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $parse(s.trim()).map(Self).map_err(|_| $error)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

id_type!(
    UserId,
    uuid::Uuid,
    uuid::Uuid::new_v4(),
    uuid::Uuid::parse_str,
    IdError::InvalidUuid,
    "A user.\n\nAlso names anonymous device identities carried in the `clientId` cookie."
);
id_type!(
    DiscId,
    uuid::Uuid,
    uuid::Uuid::new_v4(),
    uuid::Uuid::parse_str,
    IdError::InvalidUuid,
    "A disc in a user's bag."
);
id_type!(
    RoutineId,
    uuid::Uuid,
    uuid::Uuid::new_v4(),
    uuid::Uuid::parse_str,
    IdError::InvalidUuid,
    "A practice routine."
);
id_type!(
    SessionId,
    Ulid,
    Ulid::new(),
    Ulid::from_string,
    IdError::InvalidUlid,
    "A recorded session.\n\nSorts in recording order, so the ledger can be listed without \
     consulting session dates."
);

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::generate();
        let parsed = UserId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn disc_id_serializes_as_plain_string() {
        let id = DiscId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn invalid_uuid_is_rejected() {
        assert_eq!(RoutineId::from_str("not-a-uuid"), Err(IdError::InvalidUuid));
        assert!(serde_json::from_str::<DiscId>("\"nope\"").is_err());
    }

    #[test]
    fn session_ids_sort_by_creation() {
        let first = SessionId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = SessionId::generate();
        assert!(first < second);
    }

    #[test]
    fn session_id_rejects_uuid_text() {
        let uuid_text = UserId::generate().to_string();
        assert_eq!(SessionId::from_str(&uuid_text), Err(IdError::InvalidUlid));
    }
}
