//! Practice session records.
//!
//! A session is an immutable ledger entry. It stores the exact deltas it applied
//! to the aggregates, so deleting it later never depends on the current state of
//! the routine or discs it was run with.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PracticeError;
use crate::lenient;
use crate::stats::{Circle, CircleStats, Tally};
use crate::{DiscId, Owned, RoutineId, SessionId, UserId};

/// How a session attributes its throws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Hits and attempts are attributed to specific discs.
    Individual,
    /// Hits and attempts are attributed only to stations and their circle.
    Total,
}

impl SessionMode {
    /// Mode name as used in query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Total => "total",
        }
    }
}

impl FromStr for SessionMode {
    type Err = PracticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "individual" => Ok(Self::Individual),
            "total" => Ok(Self::Total),
            other => Err(PracticeError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one station in a `total` session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationResult {
    /// Distance the station was thrown from when the session was recorded.
    pub distance: f64,
    /// Hits at this station.
    #[serde(default, deserialize_with = "lenient::count")]
    pub hits: u64,
    /// Attempts at this station.
    #[serde(default, deserialize_with = "lenient::count")]
    pub attempts: u64,
}

impl StationResult {
    /// Circle the stored distance counts toward.
    #[must_use]
    pub fn circle(&self) -> Circle {
        Circle::for_distance(self.distance)
    }

    /// This station's contribution as circle stats.
    #[must_use]
    pub fn delta(&self) -> CircleStats {
        let mut delta = CircleStats::default();
        *delta.circle_mut(self.circle()) = Tally::new(self.hits, self.attempts);
        delta
    }
}

/// Compact `{h, a}` counter used inside session records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortTally {
    /// Hits.
    #[serde(default, deserialize_with = "lenient::count")]
    pub h: u64,
    /// Attempts.
    #[serde(default, deserialize_with = "lenient::count")]
    pub a: u64,
}

impl From<ShortTally> for Tally {
    fn from(short: ShortTally) -> Self {
        Tally::new(short.h, short.a)
    }
}

impl From<Tally> for ShortTally {
    fn from(tally: Tally) -> Self {
        Self {
            h: tally.hits,
            a: tally.attempts,
        }
    }
}

/// One disc's result in an `individual` session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscResult {
    /// The disc thrown.
    pub disc_id: DiscId,
    /// Circle 1 counters.
    #[serde(default)]
    pub c1: ShortTally,
    /// Circle 2 counters.
    #[serde(default)]
    pub c2: ShortTally,
}

impl DiscResult {
    /// Create a disc result from circle tallies.
    #[must_use]
    pub fn new(disc_id: DiscId, circle1: Tally, circle2: Tally) -> Self {
        Self {
            disc_id,
            c1: circle1.into(),
            c2: circle2.into(),
        }
    }

    /// This disc's contribution as circle stats.
    #[must_use]
    pub fn delta(&self) -> CircleStats {
        CircleStats::new(self.c1.into(), self.c2.into())
    }
}

/// One completed run of a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session ID (time-ordered).
    pub id: SessionId,

    /// The owning user.
    pub user_id: UserId,

    /// The routine that was run.
    pub routine_id: RoutineId,

    /// Routine name at the time of the run.
    #[serde(default)]
    pub routine_name: String,

    /// How throws were attributed.
    pub mode: SessionMode,

    /// When the session was recorded.
    pub date: DateTime<Utc>,

    /// Per-station deltas (`total` mode).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stations: Vec<StationResult>,

    /// Per-disc deltas (`individual` mode).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discs: Vec<DiscResult>,
}

impl Session {
    /// The contribution this session makes to its user's overall stats.
    #[must_use]
    pub fn deltas(&self) -> CircleStats {
        let mut total = CircleStats::default();
        match self.mode {
            SessionMode::Individual => self.discs.iter().for_each(|d| total.add(&d.delta())),
            SessionMode::Total => self.stations.iter().for_each(|s| total.add(&s.delta())),
        }
        total
    }

    /// Per-disc contributions. Empty for `total` sessions.
    pub fn disc_deltas(&self) -> impl Iterator<Item = (DiscId, CircleStats)> + '_ {
        let discs: &[DiscResult] = match self.mode {
            SessionMode::Individual => &self.discs,
            SessionMode::Total => &[],
        };
        discs.iter().map(|d| (d.disc_id, d.delta()))
    }
}

impl Owned for Session {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}
