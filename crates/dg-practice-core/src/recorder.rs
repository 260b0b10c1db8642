//! Turning a completed practice run into a session record.
//!
//! The HTTP layer hands over the raw form fields of the run. Field names follow
//! the practice form:
//!
//! | mode | fields |
//! |------|--------|
//! | `individual` | `discIds` (repeated), `attc1_<d>`, `hitc1_<d>`, `attc2_<d>`, `hitc2_<d>` |
//! | `total` | `hits_<station index>`, `attempts` (shared), optional `attempts_<station index>` |
//!
//! `<d>` is the disc ID.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PracticeError, Result, ValidationError};
use crate::lenient::truncate_non_negative;
use crate::session::{DiscResult, Session, SessionMode, StationResult};
use crate::stats::Tally;
use crate::{DiscId, Routine, SessionId};

/// Repeated field listing the discs thrown in an `individual` run.
pub const DISC_IDS_FIELD: &str = "discIds";

/// Shared "discs thrown per station" field of a `total` run.
pub const SHARED_ATTEMPTS_FIELD: &str = "attempts";

/// How malformed counts are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Missing, blank, negative or non-numeric counts become `0`; fractions are truncated.
    #[default]
    Lenient,
    /// Anything but a non-negative integer is rejected. Missing or blank fields are `0`.
    Strict,
}

impl FromStr for InputPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "false" | "0" => Ok(Self::Lenient),
            "strict" | "true" | "1" => Ok(Self::Strict),
            other => Err(format!("unknown input policy: {other}")),
        }
    }
}

impl fmt::Display for InputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Parse one submitted count under `policy`.
///
/// # Errors
///
/// Under [`InputPolicy::Strict`], returns `ValidationError::InvalidCount` for any
/// value that is not a non-negative integer.
pub fn parse_count(
    field: &str,
    raw: Option<&str>,
    policy: InputPolicy,
) -> std::result::Result<u64, ValidationError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(0);
    }
    match policy {
        InputPolicy::Lenient => Ok(trimmed
            .parse::<f64>()
            .map(truncate_non_negative)
            .unwrap_or(0)),
        InputPolicy::Strict => trimmed
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidCount {
                field: field.to_string(),
                value: trimmed.to_string(),
            }),
    }
}

/// Form-decoded `name=value` pairs in submission order.
///
/// Names may repeat; [`FormFields::get`] returns the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    /// Wrap decoded pairs.
    #[must_use]
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value submitted under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Builds immutable session records from completed runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRecorder {
    policy: InputPolicy,
}

impl SessionRecorder {
    /// Create a recorder applying `policy` to submitted counts.
    #[must_use]
    pub const fn new(policy: InputPolicy) -> Self {
        Self { policy }
    }

    /// The active input policy.
    #[must_use]
    pub const fn policy(&self) -> InputPolicy {
        self.policy
    }

    /// Record a run of `routine` dated now.
    ///
    /// `owns_disc` must answer whether a disc belongs to the routine's owner.
    ///
    /// # Errors
    ///
    /// - `PracticeError::DiscNotFound` for a submitted disc the user does not own.
    /// - `PracticeError::Validation` for a rejected count under the strict policy.
    pub fn record(
        &self,
        routine: &Routine,
        mode: SessionMode,
        fields: &FormFields,
        owns_disc: impl Fn(&DiscId) -> bool,
    ) -> Result<Session> {
        self.record_at(routine, mode, fields, owns_disc, Utc::now())
    }

    /// Record a run of `routine` with an explicit date.
    ///
    /// # Errors
    ///
    /// See [`SessionRecorder::record`].
    pub fn record_at(
        &self,
        routine: &Routine,
        mode: SessionMode,
        fields: &FormFields,
        owns_disc: impl Fn(&DiscId) -> bool,
        date: DateTime<Utc>,
    ) -> Result<Session> {
        let (stations, discs) = match mode {
            SessionMode::Individual => (Vec::new(), self.disc_results(fields, owns_disc)?),
            SessionMode::Total => (self.station_results(routine, fields)?, Vec::new()),
        };

        Ok(Session {
            id: SessionId::generate(),
            user_id: routine.user_id,
            routine_id: routine.id,
            routine_name: routine.name.clone(),
            mode,
            date,
            stations,
            discs,
        })
    }

    fn count(&self, fields: &FormFields, name: &str) -> Result<u64> {
        Ok(parse_count(name, fields.get(name), self.policy)?)
    }

    fn disc_results(
        &self,
        fields: &FormFields,
        owns_disc: impl Fn(&DiscId) -> bool,
    ) -> Result<Vec<DiscResult>> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        let submitted = fields
            .get_all(DISC_IDS_FIELD)
            .chain(fields.get_all("discIds[]"))
            .map(str::trim)
            .filter(|raw| !raw.is_empty());

        for raw_id in submitted {
            let not_found = || PracticeError::DiscNotFound {
                disc_id: raw_id.to_string(),
            };
            let disc_id: DiscId = raw_id.parse().map_err(|_| not_found())?;
            if !seen.insert(disc_id) {
                continue;
            }
            if !owns_disc(&disc_id) {
                return Err(not_found());
            }

            let circle1 = Tally::new(
                self.count(fields, &format!("hitc1_{raw_id}"))?,
                self.count(fields, &format!("attc1_{raw_id}"))?,
            );
            let circle2 = Tally::new(
                self.count(fields, &format!("hitc2_{raw_id}"))?,
                self.count(fields, &format!("attc2_{raw_id}"))?,
            );
            results.push(DiscResult::new(disc_id, circle1, circle2));
        }

        Ok(results)
    }

    fn station_results(
        &self,
        routine: &Routine,
        fields: &FormFields,
    ) -> Result<Vec<StationResult>> {
        let shared_attempts = self.count(fields, SHARED_ATTEMPTS_FIELD)?;

        routine
            .stations
            .iter()
            .enumerate()
            .map(|(index, &distance)| {
                let hits = self.count(fields, &format!("hits_{index}"))?;
                let per_station = format!("attempts_{index}");
                let attempts = match fields.get(&per_station) {
                    Some(raw) if !raw.trim().is_empty() => self.count(fields, &per_station)?,
                    _ => shared_attempts,
                };
                Ok(StationResult {
                    distance,
                    hits,
                    attempts,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CircleStats;
    use crate::UserId;

    fn ladder() -> Routine {
        Routine::new(UserId::generate(), "Ladder", vec![7.0, 12.0, 15.0]).unwrap()
    }

    #[test]
    fn total_mode_splits_stations_by_circle() {
        let fields: FormFields = [
            ("hits_0", "5"),
            ("hits_1", "3"),
            ("hits_2", "2"),
            ("attempts", "6"),
        ]
        .into_iter()
        .collect();

        let session = SessionRecorder::default()
            .record(&ladder(), SessionMode::Total, &fields, |_| false)
            .unwrap();

        assert_eq!(session.stations.len(), 3);
        assert!(session.discs.is_empty());
        let deltas = session.deltas();
        assert_eq!(deltas.circle1, Tally::new(5, 6));
        assert_eq!(deltas.circle2, Tally::new(5, 12));
    }

    #[test]
    fn per_station_attempts_override_shared_value() {
        let fields: FormFields = [("hits_0", "4"), ("attempts", "6"), ("attempts_0", "10")]
            .into_iter()
            .collect();

        let session = SessionRecorder::default()
            .record(&ladder(), SessionMode::Total, &fields, |_| false)
            .unwrap();

        assert_eq!(session.stations[0].attempts, 10);
        assert_eq!(session.stations[1].attempts, 6);
        assert_eq!(session.stations[1].hits, 0);
    }

    #[test]
    fn individual_mode_records_each_disc_once() {
        let disc = DiscId::generate();
        let id = disc.to_string();
        let fields: FormFields = vec![
            (DISC_IDS_FIELD.to_string(), id.clone()),
            (DISC_IDS_FIELD.to_string(), id.clone()),
            (format!("attc1_{id}"), "10".to_string()),
            (format!("hitc1_{id}"), "7".to_string()),
            (format!("attc2_{id}"), "5".to_string()),
            (format!("hitc2_{id}"), "3".to_string()),
        ]
        .into_iter()
        .collect();

        let session = SessionRecorder::default()
            .record(&ladder(), SessionMode::Individual, &fields, |d| *d == disc)
            .unwrap();

        assert_eq!(session.discs.len(), 1);
        assert!(session.stations.is_empty());
        let (disc_id, delta) = session.disc_deltas().next().unwrap();
        assert_eq!(disc_id, disc);
        assert_eq!(delta, CircleStats::new(Tally::new(7, 10), Tally::new(3, 5)));
        assert_eq!(session.deltas(), delta);
    }

    #[test]
    fn foreign_disc_is_rejected() {
        let fields: FormFields = [(DISC_IDS_FIELD, DiscId::generate().to_string())]
            .into_iter()
            .collect();

        let recorder = SessionRecorder::default();
        let result = recorder.record(&ladder(), SessionMode::Individual, &fields, |_| false);
        assert!(matches!(result, Err(PracticeError::DiscNotFound { .. })));

        let garbage: FormFields = [(DISC_IDS_FIELD, "not-an-id")].into_iter().collect();
        let result = recorder.record(&ladder(), SessionMode::Individual, &garbage, |_| true);
        assert!(matches!(result, Err(PracticeError::DiscNotFound { .. })));
    }

    #[test]
    fn lenient_policy_coerces_bad_counts_to_zero() {
        let policy = InputPolicy::Lenient;
        assert_eq!(parse_count("f", None, policy), Ok(0));
        assert_eq!(parse_count("f", Some(""), policy), Ok(0));
        assert_eq!(parse_count("f", Some("abc"), policy), Ok(0));
        assert_eq!(parse_count("f", Some("-3"), policy), Ok(0));
        assert_eq!(parse_count("f", Some("NaN"), policy), Ok(0));
        assert_eq!(parse_count("f", Some("2.7"), policy), Ok(2));
        assert_eq!(parse_count("f", Some(" 9 "), policy), Ok(9));
    }

    #[test]
    fn strict_policy_rejects_bad_counts() {
        let policy = InputPolicy::Strict;
        assert_eq!(parse_count("hits_0", None, policy), Ok(0));
        assert_eq!(parse_count("hits_0", Some("4"), policy), Ok(4));
        assert_eq!(
            parse_count("hits_0", Some("abc"), policy),
            Err(ValidationError::InvalidCount {
                field: "hits_0".into(),
                value: "abc".into()
            })
        );
        assert!(parse_count("hits_0", Some("-1"), policy).is_err());
        assert!(parse_count("hits_0", Some("1.5"), policy).is_err());

        let fields: FormFields = [("hits_0", "x"), ("attempts", "6")].into_iter().collect();
        let result =
            SessionRecorder::new(policy).record(&ladder(), SessionMode::Total, &fields, |_| false);
        assert!(matches!(result, Err(PracticeError::Validation(_))));
    }

    #[test]
    fn input_policy_parses_config_values() {
        assert_eq!("strict".parse::<InputPolicy>(), Ok(InputPolicy::Strict));
        assert_eq!("TRUE".parse::<InputPolicy>(), Ok(InputPolicy::Strict));
        assert_eq!("lenient".parse::<InputPolicy>(), Ok(InputPolicy::Lenient));
        assert!("maybe".parse::<InputPolicy>().is_err());
    }
}
