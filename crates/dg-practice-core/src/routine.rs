//! Practice routines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::stats::Circle;
use crate::{Owned, RoutineId, UserId};

/// A named, ordered list of station distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    /// Routine ID.
    pub id: RoutineId,

    /// The owning user.
    pub user_id: UserId,

    /// Display name.
    pub name: String,

    /// Station distances in throwing order. Every entry is greater than zero.
    pub stations: Vec<f64>,

    /// When the routine was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Routine {
    /// Create a routine, rejecting an empty name or station list.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Blank` for a blank name and
    /// `ValidationError::NoStations` if no distance is greater than zero.
    pub fn new(user_id: UserId, name: &str, stations: Vec<f64>) -> Result<Self, ValidationError> {
        let mut routine = Self {
            id: RoutineId::generate(),
            user_id,
            name: String::new(),
            stations: Vec::new(),
            created_at: Utc::now(),
        };
        routine.rename(name)?;
        routine.set_stations(stations)?;
        Ok(routine)
    }

    /// Change the display name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Blank` for a blank name.
    pub fn rename(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Blank("routine name"));
        }
        self.name = name.to_string();
        Ok(())
    }

    /// Replace the station list.
    ///
    /// Recorded sessions keep the distances they were run with.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoStations` if no distance is greater than zero.
    pub fn set_stations(&mut self, stations: Vec<f64>) -> Result<(), ValidationError> {
        let stations: Vec<f64> = stations
            .into_iter()
            .filter(|d| d.is_finite() && *d > 0.0)
            .collect();
        if stations.is_empty() {
            return Err(ValidationError::NoStations);
        }
        self.stations = stations;
        Ok(())
    }

    /// Circle each station counts toward, in station order.
    pub fn circles(&self) -> impl Iterator<Item = Circle> + '_ {
        self.stations.iter().map(|d| Circle::for_distance(*d))
    }
}

impl Owned for Routine {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

/// Parse a comma-separated distance list such as `"7, 12, 15"`.
///
/// Entries that are not numbers are dropped; validation of the remaining
/// distances happens in [`Routine::set_stations`].
#[must_use]
pub fn parse_distances(raw: &str) -> Vec<f64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .collect()
}
