//! Disc catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::lenient;
use crate::{DiscId, Owned, UserId};

/// A disc in a user's bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disc {
    /// Disc ID.
    pub id: DiscId,

    /// The owning user.
    pub user_id: UserId,

    /// Optional nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Manufacturer name.
    #[serde(default)]
    pub brand: String,

    /// Mold name.
    #[serde(default)]
    pub model: String,

    /// Plastic blend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plastic: Option<String>,

    /// Weight in grams.
    #[serde(
        default,
        deserialize_with = "lenient::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight: Option<f64>,

    /// Color description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Flight numbers.
    #[serde(default, deserialize_with = "FlightNumbers::deserialize_any")]
    pub flight: FlightNumbers,

    /// Stored image file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// When the disc was added.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Disc {
    /// Create a new disc owned by `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, brand: String, model: String) -> Self {
        Self {
            id: DiscId::generate(),
            user_id,
            alias: None,
            brand,
            model,
            plastic: None,
            weight: None,
            color: None,
            flight: FlightNumbers::default(),
            image: None,
            created_at: Utc::now(),
        }
    }

    /// Name to show in lists: the alias when set, otherwise brand and model.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.alias.as_deref().map(str::trim) {
            Some(alias) if !alias.is_empty() => alias.to_string(),
            _ => format!("{} {}", self.brand, self.model).trim().to_string(),
        }
    }
}

impl Owned for Disc {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

/// Speed, glide, turn and fade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightNumbers {
    /// Speed.
    #[serde(default)]
    pub speed: f64,
    /// Glide.
    #[serde(default)]
    pub glide: f64,
    /// Turn.
    #[serde(default)]
    pub turn: f64,
    /// Fade.
    #[serde(default)]
    pub fade: f64,
}

impl FlightNumbers {
    /// Create flight numbers.
    #[must_use]
    pub const fn new(speed: f64, glide: f64, turn: f64, fade: f64) -> Self {
        Self {
            speed,
            glide,
            turn,
            fade,
        }
    }

    /// Parse the legacy pipe-delimited form, e.g. `"12|5|-1|3"`.
    ///
    /// Missing or unparseable parts become `0`.
    #[must_use]
    pub fn parse_legacy(raw: &str) -> Self {
        let mut parts = raw
            .split('|')
            .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0));
        let mut next = || parts.next().unwrap_or(0.0);
        Self::new(next(), next(), next(), next())
    }

    /// Accepts either the structured record or the legacy string.
    ///
    /// # Errors
    ///
    /// Returns an error only if the JSON itself cannot be read.
    pub fn deserialize_any<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(raw) => Self::parse_legacy(&raw),
            Value::Object(map) => {
                let field = |name: &str| {
                    map.get(name)
                        .and_then(lenient::coerce_number)
                        .unwrap_or(0.0)
                };
                Self::new(field("speed"), field("glide"), field("turn"), field("fade"))
            }
            _ => Self::default(),
        })
    }
}
