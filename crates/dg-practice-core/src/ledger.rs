//! Applying and reversing sessions against a user's cached aggregates.
//!
//! The session list is the ledger; [`Aggregates`] is a cache over it. The cache is
//! always defined by [`Aggregates::rebuild`], and [`Aggregates::apply`] and
//! [`Aggregates::rollback`] are incremental versions of the same fold.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::stats::{Circle, CircleStats, StatsSummary, Tally};
use crate::DiscId;

/// A user's overall stats plus the stats of each of their discs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregates {
    /// Overall stats of the user.
    pub user: CircleStats,
    /// Per-disc stats, keyed by disc.
    pub discs: BTreeMap<DiscId, CircleStats>,
}

impl Aggregates {
    /// Fold `sessions` from zero.
    pub fn rebuild<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        sessions.into_iter().fold(Self::default(), |mut acc, session| {
            acc.apply(session);
            acc
        })
    }

    /// Stats for one disc, zero when the disc has none.
    #[must_use]
    pub fn disc(&self, disc_id: &DiscId) -> CircleStats {
        self.discs.get(disc_id).copied().unwrap_or_default()
    }

    /// Add a session's recorded deltas.
    pub fn apply(&mut self, session: &Session) {
        for (disc_id, delta) in session.disc_deltas() {
            self.discs.entry(disc_id).or_default().add(&delta);
        }
        self.user.add(&session.deltas());
    }

    /// Subtract a session's recorded deltas, clamping every counter at zero.
    ///
    /// A disc without a stats entry is skipped; the user's stats are still
    /// reduced by that disc's contribution.
    pub fn rollback(&mut self, session: &Session) -> RollbackReport {
        let mut report = RollbackReport::default();

        for (disc_id, delta) in session.disc_deltas() {
            let Some(stats) = self.discs.get_mut(&disc_id) else {
                continue;
            };
            for (circle, shortfall) in stats.saturating_sub(&delta) {
                report.clamped.push(ClampEvent {
                    disc_id: Some(disc_id),
                    circle,
                    shortfall,
                });
            }
        }

        for (circle, shortfall) in self.user.saturating_sub(&session.deltas()) {
            report.clamped.push(ClampEvent {
                disc_id: None,
                circle,
                shortfall,
            });
        }

        report
    }

    /// Drop stats of discs for which `keep` returns false.
    pub fn retain_discs(&mut self, mut keep: impl FnMut(&DiscId) -> bool) {
        self.discs.retain(|disc_id, _| keep(disc_id));
    }

    /// Drop stats of discs not listed in `live`.
    pub fn retain_live(&mut self, live: &BTreeSet<DiscId>) {
        self.retain_discs(|disc_id| live.contains(disc_id));
    }
}

// Zeroed and missing disc entries are the same state.
impl PartialEq for Aggregates {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user
            && self
                .discs
                .keys()
                .chain(other.discs.keys())
                .all(|disc_id| self.disc(disc_id) == other.disc(disc_id))
    }
}

impl Eq for Aggregates {}

/// A counter that would have gone negative during a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClampEvent {
    /// The disc whose stats were clamped, or `None` for the user's overall stats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_id: Option<DiscId>,
    /// The circle that was clamped.
    pub circle: Circle,
    /// How much could not be subtracted.
    pub shortfall: Tally,
}

/// Outcome of a rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Every clamped counter. Empty when the rollback was exact.
    pub clamped: Vec<ClampEvent>,
}

impl RollbackReport {
    /// Whether the cached aggregates covered the whole session.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.clamped.is_empty()
    }
}

/// Totals of every session recorded on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Calendar day (UTC).
    pub day: NaiveDate,
    /// Number of sessions that day.
    pub sessions: usize,
    /// Summed counters.
    pub stats: CircleStats,
    /// Accuracy figures for `stats`.
    pub summary: StatsSummary,
}

/// Group sessions by UTC day, oldest day first.
pub fn daily_timeline<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Vec<DailyStats> {
    let mut days: BTreeMap<NaiveDate, (usize, CircleStats)> = BTreeMap::new();
    for session in sessions {
        let (count, stats) = days.entry(session.date.date_naive()).or_default();
        *count += 1;
        stats.add(&session.deltas());
    }

    days.into_iter()
        .map(|(day, (sessions, stats))| DailyStats {
            day,
            sessions,
            stats,
            summary: stats.summary(),
        })
        .collect()
}
