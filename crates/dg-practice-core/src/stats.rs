//! Hit/attempt counters and accuracy percentages.
//!
//! Everything here is pure: the same counters always produce the same summary,
//! which is what lets aggregates be recomputed from the session ledger at any time.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// Stations at or below this distance count toward circle 1.
pub const CIRCLE1_MAX_DISTANCE: f64 = 10.0;

/// Accuracy percentage for `hits` out of `attempts`.
///
/// Returns `0` when there are no attempts, otherwise `100 * hits / attempts`
/// rounded half away from zero. Computed in integer arithmetic so every call
/// site agrees on the rounding.
///
/// ```
/// use dg_practice_core::percentage;
///
/// assert_eq!(percentage(1, 3), 33);
/// assert_eq!(percentage(2, 3), 67);
/// assert_eq!(percentage(5, 0), 0);
/// ```
#[must_use]
pub fn percentage(hits: u64, attempts: u64) -> u32 {
    if attempts == 0 {
        return 0;
    }
    let hits = u128::from(hits);
    let attempts = u128::from(attempts);
    let rounded = (200 * hits + attempts) / (2 * attempts);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// One of the two target circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Circle {
    /// Throws from 10 distance units or closer.
    Circle1,
    /// Throws from beyond 10 distance units.
    Circle2,
}

impl Circle {
    /// Classify a station distance.
    #[must_use]
    pub fn for_distance(distance: f64) -> Self {
        if distance <= CIRCLE1_MAX_DISTANCE {
            Self::Circle1
        } else {
            Self::Circle2
        }
    }

    /// Short name used in logs and responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Circle1 => "circle1",
            Self::Circle2 => "circle2",
        }
    }
}

/// A hit/attempt counter pair.
///
/// `hits <= attempts` is not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tally {
    /// Successful throws.
    #[serde(default, deserialize_with = "lenient::count")]
    pub hits: u64,
    /// Throws taken.
    #[serde(default, deserialize_with = "lenient::count")]
    pub attempts: u64,
}

impl Tally {
    /// Create a tally.
    #[must_use]
    pub const fn new(hits: u64, attempts: u64) -> Self {
        Self { hits, attempts }
    }

    /// Whether both counters are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.hits == 0 && self.attempts == 0
    }

    /// Add another tally.
    pub fn add(&mut self, other: Tally) {
        self.hits = self.hits.saturating_add(other.hits);
        self.attempts = self.attempts.saturating_add(other.attempts);
    }

    /// Subtract another tally, clamping each counter at zero.
    ///
    /// Returns the shortfall: how much could not be subtracted. A zero shortfall
    /// means the subtraction was exact.
    pub fn saturating_sub(&mut self, other: Tally) -> Tally {
        let shortfall = Tally {
            hits: other.hits.saturating_sub(self.hits),
            attempts: other.attempts.saturating_sub(self.attempts),
        };
        self.hits = self.hits.saturating_sub(other.hits);
        self.attempts = self.attempts.saturating_sub(other.attempts);
        shortfall
    }

    /// Accuracy of this tally.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.hits, self.attempts)
    }

    /// Counters plus accuracy, ready for display.
    #[must_use]
    pub fn summary(&self) -> TallySummary {
        TallySummary {
            h: self.hits,
            a: self.attempts,
            pct: self.percentage(),
        }
    }
}

/// Circle 1 and circle 2 counters.
///
/// Used both for per-disc stats and for a user's overall stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircleStats {
    /// Counters for circle 1.
    #[serde(default)]
    pub circle1: Tally,
    /// Counters for circle 2.
    #[serde(default)]
    pub circle2: Tally,
}

impl CircleStats {
    /// Create stats from the two circle tallies.
    #[must_use]
    pub const fn new(circle1: Tally, circle2: Tally) -> Self {
        Self { circle1, circle2 }
    }

    /// The tally for one circle.
    #[must_use]
    pub const fn circle(&self, circle: Circle) -> &Tally {
        match circle {
            Circle::Circle1 => &self.circle1,
            Circle::Circle2 => &self.circle2,
        }
    }

    /// Mutable tally for one circle.
    pub fn circle_mut(&mut self, circle: Circle) -> &mut Tally {
        match circle {
            Circle::Circle1 => &mut self.circle1,
            Circle::Circle2 => &mut self.circle2,
        }
    }

    /// Whether every counter is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.circle1.is_zero() && self.circle2.is_zero()
    }

    /// Both circles combined.
    #[must_use]
    pub fn total(&self) -> Tally {
        let mut total = self.circle1;
        total.add(self.circle2);
        total
    }

    /// Add another set of circle stats.
    pub fn add(&mut self, other: &CircleStats) {
        self.circle1.add(other.circle1);
        self.circle2.add(other.circle2);
    }

    /// Subtract another set of circle stats, clamping at zero.
    ///
    /// Returns the circles whose subtraction was clamped, with the shortfall.
    pub fn saturating_sub(&mut self, other: &CircleStats) -> Vec<(Circle, Tally)> {
        [Circle::Circle1, Circle::Circle2]
            .into_iter()
            .filter_map(|circle| {
                let shortfall = self.circle_mut(circle).saturating_sub(*other.circle(circle));
                (!shortfall.is_zero()).then_some((circle, shortfall))
            })
            .collect()
    }

    /// Sum a sequence of circle stats.
    pub fn fold<'a>(items: impl IntoIterator<Item = &'a CircleStats>) -> Self {
        items.into_iter().fold(Self::default(), |mut acc, item| {
            acc.add(item);
            acc
        })
    }

    /// Per-circle and combined accuracy.
    #[must_use]
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            c1: self.circle1.summary(),
            c2: self.circle2.summary(),
            total: self.total().summary(),
        }
    }
}

/// Display figures for one tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallySummary {
    /// Hits.
    pub h: u64,
    /// Attempts.
    pub a: u64,
    /// Accuracy percentage.
    pub pct: u32,
}

/// Display figures for circle 1, circle 2 and both combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Circle 1.
    pub c1: TallySummary,
    /// Circle 2.
    pub c2: TallySummary,
    /// Both circles combined.
    pub total: TallySummary,
}
