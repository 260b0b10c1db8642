//! The persisted document and its derived-state maintenance.
//!
//! # Layout
//!
//! ```json
//! {
//!   "users": [...], "discs": [...], "routines": [...], "sessions": [...],
//!   "manufacturers": [...],
//!   "stats": { "<userId>": { "circle1": {...}, "circle2": {...} } },
//!   "discStats": { "<discId>": { "circle1": {...}, "circle2": {...} } }
//! }
//! ```
//!
//! `stats` and `discStats` are caches over `sessions`. Older documents kept a
//! single `stats` record shared by everyone; it is discarded on load and each
//! user's stats are rebuilt from their sessions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dg_practice_core::{
    Aggregates, CircleStats, Disc, DiscId, Manufacturer, Owned, Routine, Session, User, UserId,
};

use crate::error::Result;

/// The whole persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Registered users.
    #[serde(default)]
    pub users: Vec<User>,
    /// Discs of every user.
    #[serde(default)]
    pub discs: Vec<Disc>,
    /// Routines of every user.
    #[serde(default)]
    pub routines: Vec<Routine>,
    /// The session ledger.
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// Manufacturer catalog.
    #[serde(default)]
    pub manufacturers: Vec<Manufacturer>,
    /// Overall stats per user.
    #[serde(default)]
    pub stats: BTreeMap<UserId, CircleStats>,
    /// Stats per disc.
    #[serde(default)]
    pub disc_stats: BTreeMap<DiscId, CircleStats>,
}

/// What [`Document::normalize`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    /// Users whose overall stats differed from the session fold.
    pub users: Vec<UserId>,
    /// Discs whose stats differed from the session fold, or were orphaned.
    pub discs: Vec<DiscId>,
}

impl NormalizeReport {
    /// Whether nothing had to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.discs.is_empty()
    }
}

impl Document {
    /// Parse a document, upgrading older layouts.
    ///
    /// Blank input yields an empty document. Records without a valid owner are
    /// adopted by a freshly generated user; see [`Document::from_json_with_owner`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the JSON cannot be read as a document.
    pub fn from_json(raw: &str) -> Result<Self> {
        Self::from_json_with_owner(raw, None)
    }

    /// Parse a document, giving unowned records to `legacy_owner`.
    ///
    /// Older documents stored discs, routines and sessions without a `userId`
    /// (or with one that is not a user ID). Each such record is assigned to
    /// `legacy_owner`, or to a single generated user when none is given, and
    /// the cached stats are rebuilt.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the JSON cannot be read as a document.
    pub fn from_json_with_owner(raw: &str, legacy_owner: Option<UserId>) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut value: Value = serde_json::from_str(raw)?;
        let legacy_stats = value
            .as_object_mut()
            .map(|root| match root.get("stats") {
                Some(stats) if is_per_user_stats(stats) => false,
                Some(_) => {
                    root.remove("stats");
                    true
                }
                None => false,
            })
            .unwrap_or(false);

        let owner = legacy_owner.unwrap_or_else(UserId::generate);
        let adopted = adopt_unowned(&mut value, owner);

        let mut document: Self = serde_json::from_value(value)?;
        if legacy_stats || adopted > 0 {
            let report = document.normalize();
            if adopted > 0 {
                tracing::warn!(
                    owner = %owner,
                    records = adopted,
                    "Assigned unowned records to legacy owner"
                );
            }
            tracing::warn!(
                users = report.users.len(),
                discs = report.discs.len(),
                "Upgraded legacy document and rebuilt per-user stats"
            );
        }
        Ok(document)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// IDs of the discs `user_id` currently owns.
    #[must_use]
    pub fn disc_ids_of(&self, user_id: &UserId) -> BTreeSet<DiscId> {
        self.discs
            .iter()
            .filter(|d| d.belongs_to(user_id))
            .map(|d| d.id)
            .collect()
    }

    /// The cached aggregates of `user_id`.
    #[must_use]
    pub fn aggregates(&self, user_id: &UserId) -> Aggregates {
        let discs = self
            .disc_ids_of(user_id)
            .into_iter()
            .filter_map(|id| self.disc_stats.get(&id).map(|stats| (id, *stats)))
            .collect();
        Aggregates {
            user: self.stats.get(user_id).copied().unwrap_or_default(),
            discs,
        }
    }

    /// Write `aggregates` back as the cache of `user_id`.
    ///
    /// Disc entries for discs the user no longer owns are dropped.
    pub fn store_aggregates(&mut self, user_id: &UserId, aggregates: &Aggregates) {
        self.stats.insert(*user_id, aggregates.user);
        for disc_id in self.disc_ids_of(user_id) {
            match aggregates.discs.get(&disc_id) {
                Some(stats) => {
                    self.disc_stats.insert(disc_id, *stats);
                }
                None => {
                    self.disc_stats.remove(&disc_id);
                }
            }
        }
    }

    /// Sessions of `user_id`, in ledger order.
    pub fn sessions_of<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> impl Iterator<Item = &'a Session> + 'a {
        self.sessions.iter().filter(move |s| s.belongs_to(user_id))
    }

    /// The aggregates of `user_id` as defined by folding their sessions.
    #[must_use]
    pub fn fold(&self, user_id: &UserId) -> Aggregates {
        let mut aggregates = Aggregates::rebuild(self.sessions_of(user_id));
        aggregates.retain_live(&self.disc_ids_of(user_id));
        aggregates
    }

    /// Every user ID that owns anything in the document.
    #[must_use]
    pub fn owners(&self) -> BTreeSet<UserId> {
        self.users
            .iter()
            .map(|u| u.id)
            .chain(self.discs.iter().map(|d| d.user_id))
            .chain(self.routines.iter().map(|r| r.user_id))
            .chain(self.sessions.iter().map(|s| s.user_id))
            .chain(self.stats.keys().copied())
            .collect()
    }

    /// Rebuild every cached aggregate from the session ledger.
    ///
    /// Stats of discs that no longer exist are removed.
    pub fn normalize(&mut self) -> NormalizeReport {
        let mut report = NormalizeReport::default();

        let live: BTreeSet<DiscId> = self.discs.iter().map(|d| d.id).collect();
        let orphaned: Vec<DiscId> = self
            .disc_stats
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        for disc_id in orphaned {
            self.disc_stats.remove(&disc_id);
            report.discs.push(disc_id);
        }

        for user_id in self.owners() {
            let cached = self.aggregates(&user_id);
            let folded = self.fold(&user_id);
            if cached == folded {
                continue;
            }

            if cached.user != folded.user {
                report.users.push(user_id);
            }
            for disc_id in cached.discs.keys().chain(folded.discs.keys()) {
                if cached.disc(disc_id) != folded.disc(disc_id) && !report.discs.contains(disc_id) {
                    report.discs.push(*disc_id);
                }
            }
            self.store_aggregates(&user_id, &folded);
        }

        report
    }
}

// Sets `userId` on every disc, routine and session whose owner is missing or
// unparseable. Returns how many records changed.
fn adopt_unowned(root: &mut Value, owner: UserId) -> usize {
    let mut adopted = 0;
    for key in ["discs", "routines", "sessions"] {
        let Some(records) = root.get_mut(key).and_then(Value::as_array_mut) else {
            continue;
        };
        for record in records.iter_mut().filter_map(Value::as_object_mut) {
            let owned = record
                .get("userId")
                .and_then(Value::as_str)
                .is_some_and(|id| id.parse::<UserId>().is_ok());
            if !owned {
                record.insert("userId".into(), Value::String(owner.to_string()));
                adopted += 1;
            }
        }
    }
    adopted
}

// The current layout is an object keyed by user ID; the old one is a single
// `{circle1, circle2}` record.
fn is_per_user_stats(stats: &Value) -> bool {
    stats
        .as_object()
        .is_some_and(|map| map.keys().all(|key| key.parse::<UserId>().is_ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_practice_core::{DiscResult, FlightNumbers, RoutineId, SessionId, SessionMode, Tally};

    fn individual(user_id: UserId, disc_id: DiscId, c1: Tally) -> Session {
        Session {
            id: SessionId::generate(),
            user_id,
            routine_id: RoutineId::generate(),
            routine_name: "Ladder".into(),
            mode: SessionMode::Individual,
            date: chrono::Utc::now(),
            stations: Vec::new(),
            discs: vec![DiscResult::new(disc_id, c1, Tally::default())],
        }
    }

    #[test]
    fn blank_input_is_empty_document() {
        assert_eq!(Document::from_json("  \n").unwrap(), Document::default());
    }

    #[test]
    fn legacy_shared_stats_are_rebuilt_per_user() {
        let user_id = UserId::generate();
        let disc = Disc::new(user_id, "Innova".into(), "Aviar".into());
        let session = individual(user_id, disc.id, Tally::new(4, 5));

        let raw = serde_json::json!({
            "users": [],
            "discs": [disc],
            "sessions": [session],
            "stats": { "circle1": { "hits": 999, "attempts": 1000 }, "circle2": {} },
            "discStats": { (disc.id.to_string()): { "circle1": { "hits": "4", "attempts": "5" } } }
        })
        .to_string();

        let document = Document::from_json(&raw).unwrap();
        assert_eq!(document.stats.len(), 1);
        assert_eq!(document.stats[&user_id].circle1, Tally::new(4, 5));
        assert_eq!(document.disc_stats[&disc.id].circle1, Tally::new(4, 5));
        assert_eq!(document.aggregates(&user_id), document.fold(&user_id));
    }

    #[test]
    fn unowned_legacy_records_get_the_legacy_owner() {
        let owner = UserId::generate();
        let disc_id = DiscId::generate();
        let routine_id = RoutineId::generate();

        let raw = serde_json::json!({
            "discs": [{
                "id": disc_id.to_string(),
                "brand": "Innova",
                "model": "Aviar",
                "plastic": "DX",
                "weight": "175",
                "color": "white",
                "flight": "2|3|0|1"
            }],
            "routines": [{
                "id": routine_id.to_string(),
                "name": "Ladder",
                "stations": [7, 12, 15]
            }],
            "stats": {
                "circle1": { "hits": 10, "attempts": 20 },
                "circle2": { "hits": "3", "attempts": "9" }
            },
            "discStats": {
                (disc_id.to_string()): { "circle1": { "hits": "4", "attempts": "5" } }
            }
        })
        .to_string();

        let document = Document::from_json_with_owner(&raw, Some(owner)).unwrap();

        let disc = &document.discs[0];
        assert_eq!(disc.user_id, owner);
        assert_eq!(disc.weight, Some(175.0));
        assert_eq!(disc.flight, FlightNumbers::new(2.0, 3.0, 0.0, 1.0));
        assert_eq!(document.routines[0].user_id, owner);
        assert_eq!(document.routines[0].stations, vec![7.0, 12.0, 15.0]);

        // No sessions back the old counters, so the rebuild zeroes them.
        assert_eq!(document.aggregates(&owner).user, CircleStats::default());
        assert!(!document.disc_stats.contains_key(&disc_id));
        assert_eq!(document.aggregates(&owner), document.fold(&owner));
        assert_eq!(document.owners(), BTreeSet::from([owner]));
    }

    #[test]
    fn unparseable_owner_is_replaced() {
        let raw = serde_json::json!({
            "routines": [
                {
                    "id": RoutineId::generate().to_string(),
                    "userId": "local",
                    "name": "A",
                    "stations": [5]
                },
                { "id": RoutineId::generate().to_string(), "name": "B", "stations": [15] }
            ]
        })
        .to_string();

        let document = Document::from_json(&raw).unwrap();
        let owners = document.owners();
        assert_eq!(owners.len(), 1);
        assert!(document.routines.iter().all(|r| owners.contains(&r.user_id)));
    }

    #[test]
    fn normalize_reports_drift_and_orphans() {
        let user_id = UserId::generate();
        let disc = Disc::new(user_id, "Innova".into(), "Aviar".into());
        let orphan = DiscId::generate();

        let mut document = Document {
            sessions: vec![individual(user_id, disc.id, Tally::new(2, 3))],
            discs: vec![disc.clone()],
            ..Document::default()
        };
        document
            .disc_stats
            .insert(orphan, CircleStats::new(Tally::new(1, 1), Tally::default()));

        let report = document.normalize();
        assert_eq!(report.users, vec![user_id]);
        assert!(report.discs.contains(&orphan));
        assert!(report.discs.contains(&disc.id));
        assert!(!document.disc_stats.contains_key(&orphan));

        // Already consistent.
        assert!(document.normalize().is_empty());
    }

    #[test]
    fn aggregates_only_include_owned_discs() {
        let alice = UserId::generate();
        let bob = UserId::generate();
        let alice_disc = Disc::new(alice, "MVP".into(), "Envy".into());
        let bob_disc = Disc::new(bob, "Axiom".into(), "Envy".into());

        let mut document = Document {
            discs: vec![alice_disc.clone(), bob_disc.clone()],
            ..Document::default()
        };
        document
            .disc_stats
            .insert(alice_disc.id, CircleStats::new(Tally::new(1, 2), Tally::default()));
        document
            .disc_stats
            .insert(bob_disc.id, CircleStats::new(Tally::new(3, 4), Tally::default()));

        let aggregates = document.aggregates(&alice);
        assert_eq!(aggregates.discs.len(), 1);
        assert!(aggregates.discs.contains_key(&alice_disc.id));
    }
}
