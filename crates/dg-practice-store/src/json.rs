//! JSON file storage implementation.
//!
//! This module provides the `JsonStore` implementation of the `Store` trait.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use dg_practice_core::user::normalize_key;
use dg_practice_core::{
    default_catalog, Aggregates, CircleStats, Disc, DiscId, Manufacturer, Owned, RollbackReport,
    Routine, RoutineId, Session, SessionId, User, UserId,
};

use crate::document::{Document, NormalizeReport};
use crate::error::{Result, StoreError};
use crate::fs;
use crate::Store;

/// Store backed by a single JSON document.
///
/// Mutations run against a copy of the document; the copy is written to disk and
/// only then replaces the in-memory state. A failed write leaves both unchanged.
pub struct JsonStore {
    path: Option<PathBuf>,
    document: Mutex<Document>,
}

impl JsonStore {
    /// Open or create the document at `path`.
    ///
    /// A missing or empty file starts an empty document. The manufacturer catalog
    /// is seeded if it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or written.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_legacy_owner(path, None)
    }

    /// Open or create the document at `path`, giving records that predate
    /// per-user ownership to `legacy_owner`.
    ///
    /// Without a legacy owner a new user ID is generated. The upgraded document
    /// is written back, so the assignment is stable across restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or written.
    pub fn open_with_legacy_owner<P: AsRef<Path>>(
        path: P,
        legacy_owner: Option<UserId>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match fs::read_optional(&path)? {
            Some(raw) => Document::from_json_with_owner(&raw, legacy_owner)?,
            None => Document::default(),
        };

        tracing::info!(
            path = %path.display(),
            users = document.users.len(),
            sessions = document.sessions.len(),
            "Opened document"
        );

        let store = Self {
            path: Some(path),
            document: Mutex::new(document),
        };
        store.seed_if_empty()?;
        store.persist_current()?;
        Ok(store)
    }

    /// Create a store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_document(Document {
            manufacturers: default_catalog(),
            ..Document::default()
        })
    }

    /// Create an in-memory store over an existing document.
    #[must_use]
    pub fn from_document(document: Document) -> Self {
        Self {
            path: None,
            document: Mutex::new(document),
        }
    }

    /// The backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.document.lock().clone()
    }

    fn seed_if_empty(&self) -> Result<()> {
        if self.read(|doc| doc.manufacturers.is_empty()) {
            let inserted = self.seed_manufacturers(&default_catalog())?;
            tracing::info!(inserted, "Seeded manufacturer catalog");
        }
        Ok(())
    }

    fn persist(&self, document: &Document) -> Result<()> {
        if let Some(path) = &self.path {
            fs::write_atomic(path, &document.to_json()?)?;
            tracing::debug!(path = %path.display(), "Persisted document");
        }
        Ok(())
    }

    fn persist_current(&self) -> Result<()> {
        let guard = self.document.lock();
        self.persist(&guard)
    }

    /// Run `f` against the current document.
    fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> T {
        f(&self.document.lock())
    }

    /// Run `f` against a copy of the document and commit the copy if it succeeds.
    fn mutate<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut guard = self.document.lock();
        let mut next = guard.clone();
        let output = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(output)
    }
}

fn ensure_unique_login(doc: &Document, user: &User) -> Result<()> {
    if let Some(existing) = doc.users.iter().find(|u| u.conflicts_with(user)) {
        let field = if normalize_key(&existing.username) == normalize_key(&user.username) {
            "username"
        } else {
            "email"
        };
        return Err(StoreError::Conflict(format!("{field} is already taken")));
    }
    Ok(())
}

fn page<T>(items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

impl Store for JsonStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn create_user(&self, user: &User) -> Result<()> {
        self.mutate(|doc| {
            if doc.users.iter().any(|u| u.id == user.id) {
                return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
            }
            ensure_unique_login(doc, user)?;
            doc.users.push(user.clone());
            Ok(())
        })
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.read(|doc| doc.users.iter().find(|u| u.id == *user_id).cloned()))
    }

    fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        Ok(self.read(|doc| doc.users.iter().find(|u| u.matches_login(login)).cloned()))
    }

    fn update_user(&self, user: &User) -> Result<()> {
        self.mutate(|doc| {
            ensure_unique_login(doc, user)?;
            let existing = doc
                .users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or_else(|| StoreError::not_found("user", user.id))?;
            *existing = user.clone();
            Ok(())
        })
    }

    // =========================================================================
    // Disc Operations
    // =========================================================================

    fn put_disc(&self, disc: &Disc) -> Result<()> {
        self.mutate(|doc| {
            match doc.discs.iter_mut().find(|d| d.id == disc.id) {
                Some(existing) if !existing.belongs_to(&disc.user_id) => {
                    return Err(StoreError::not_found("disc", disc.id));
                }
                Some(existing) => *existing = disc.clone(),
                None => doc.discs.push(disc.clone()),
            }
            Ok(())
        })
    }

    fn get_disc(&self, user_id: &UserId, disc_id: &DiscId) -> Result<Option<Disc>> {
        Ok(self.read(|doc| {
            doc.discs
                .iter()
                .find(|d| d.id == *disc_id && d.belongs_to(user_id))
                .cloned()
        }))
    }

    fn list_discs_by_user(&self, user_id: &UserId) -> Result<Vec<Disc>> {
        let mut discs: Vec<Disc> = self.read(|doc| {
            doc.discs
                .iter()
                .filter(|d| d.belongs_to(user_id))
                .cloned()
                .collect()
        });
        discs.sort_by_key(|d| d.created_at);
        Ok(discs)
    }

    fn delete_disc(&self, user_id: &UserId, disc_id: &DiscId) -> Result<()> {
        self.mutate(|doc| {
            let index = doc
                .discs
                .iter()
                .position(|d| d.id == *disc_id && d.belongs_to(user_id))
                .ok_or_else(|| StoreError::not_found("disc", disc_id))?;
            doc.discs.remove(index);
            doc.disc_stats.remove(disc_id);
            Ok(())
        })
    }

    // =========================================================================
    // Routine Operations
    // =========================================================================

    fn put_routine(&self, routine: &Routine) -> Result<()> {
        self.mutate(|doc| {
            match doc.routines.iter_mut().find(|r| r.id == routine.id) {
                Some(existing) if !existing.belongs_to(&routine.user_id) => {
                    return Err(StoreError::not_found("routine", routine.id));
                }
                Some(existing) => *existing = routine.clone(),
                None => doc.routines.push(routine.clone()),
            }
            Ok(())
        })
    }

    fn get_routine(&self, user_id: &UserId, routine_id: &RoutineId) -> Result<Option<Routine>> {
        Ok(self.read(|doc| {
            doc.routines
                .iter()
                .find(|r| r.id == *routine_id && r.belongs_to(user_id))
                .cloned()
        }))
    }

    fn list_routines_by_user(&self, user_id: &UserId) -> Result<Vec<Routine>> {
        let mut routines: Vec<Routine> = self.read(|doc| {
            doc.routines
                .iter()
                .filter(|r| r.belongs_to(user_id))
                .cloned()
                .collect()
        });
        routines.sort_by_key(|r| r.created_at);
        Ok(routines)
    }

    fn delete_routine(&self, user_id: &UserId, routine_id: &RoutineId) -> Result<()> {
        self.mutate(|doc| {
            let index = doc
                .routines
                .iter()
                .position(|r| r.id == *routine_id && r.belongs_to(user_id))
                .ok_or_else(|| StoreError::not_found("routine", routine_id))?;
            doc.routines.remove(index);
            Ok(())
        })
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    fn list_sessions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> =
            self.read(|doc| doc.sessions_of(user_id).cloned().collect());
        // Newest first; ULIDs break ties between sessions recorded in the same instant.
        sessions.sort_by_key(|s| Reverse((s.date, s.id)));
        Ok(page(sessions, limit, offset))
    }

    fn count_sessions_by_user(&self, user_id: &UserId) -> Result<usize> {
        Ok(self.read(|doc| doc.sessions_of(user_id).count()))
    }

    fn get_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<Option<Session>> {
        Ok(self.read(|doc| {
            doc.sessions_of(user_id)
                .find(|s| s.id == *session_id)
                .cloned()
        }))
    }

    // =========================================================================
    // Stats Operations
    // =========================================================================

    fn get_user_stats(&self, user_id: &UserId) -> Result<CircleStats> {
        Ok(self.read(|doc| doc.stats.get(user_id).copied().unwrap_or_default()))
    }

    fn get_disc_stats(&self, user_id: &UserId, disc_id: &DiscId) -> Result<Option<CircleStats>> {
        Ok(self.read(|doc| {
            doc.discs
                .iter()
                .any(|d| d.id == *disc_id && d.belongs_to(user_id))
                .then(|| doc.disc_stats.get(disc_id).copied().unwrap_or_default())
        }))
    }

    // =========================================================================
    // Manufacturer Operations
    // =========================================================================

    fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> {
        let mut manufacturers = self.read(|doc| doc.manufacturers.clone());
        manufacturers.sort_by_key(|m| m.name.to_lowercase());
        Ok(manufacturers)
    }

    fn seed_manufacturers(&self, manufacturers: &[Manufacturer]) -> Result<usize> {
        self.mutate(|doc| {
            let mut inserted = 0;
            for manufacturer in manufacturers {
                match doc.manufacturers.iter_mut().find(|m| m.id == manufacturer.id) {
                    Some(existing) => existing.name.clone_from(&manufacturer.name),
                    None => {
                        doc.manufacturers.push(manufacturer.clone());
                        inserted += 1;
                    }
                }
            }
            Ok(inserted)
        })
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn record_session(&self, session: &Session) -> Result<CircleStats> {
        self.mutate(|doc| {
            if doc.sessions.iter().any(|s| s.id == session.id) {
                return Err(StoreError::Conflict(format!(
                    "session {} already exists",
                    session.id
                )));
            }

            let owned = doc.disc_ids_of(&session.user_id);
            if let Some((disc_id, _)) = session.disc_deltas().find(|(id, _)| !owned.contains(id)) {
                return Err(StoreError::not_found("disc", disc_id));
            }

            let mut aggregates = doc.aggregates(&session.user_id);
            aggregates.apply(session);
            doc.store_aggregates(&session.user_id, &aggregates);
            doc.sessions.push(session.clone());

            Ok(aggregates.user)
        })
    }

    fn delete_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<RollbackReport> {
        self.mutate(|doc| {
            let index = doc
                .sessions
                .iter()
                .position(|s| s.id == *session_id && s.belongs_to(user_id))
                .ok_or_else(|| StoreError::not_found("session", session_id))?;
            let session = doc.sessions.remove(index);

            let mut aggregates = doc.aggregates(user_id);
            let report = aggregates.rollback(&session);
            doc.store_aggregates(user_id, &aggregates);

            for event in &report.clamped {
                tracing::warn!(
                    user_id = %user_id,
                    session_id = %session_id,
                    disc_id = ?event.disc_id,
                    circle = event.circle.as_str(),
                    missing_hits = event.shortfall.hits,
                    missing_attempts = event.shortfall.attempts,
                    "Cached stats were lower than the deleted session's deltas; clamped at zero"
                );
            }

            Ok(report)
        })
    }

    fn rebuild_stats(&self, user_id: &UserId) -> Result<Aggregates> {
        self.mutate(|doc| {
            let folded = doc.fold(user_id);
            doc.store_aggregates(user_id, &folded);
            Ok(folded)
        })
    }

    fn verify_stats(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.read(|doc| doc.aggregates(user_id) == doc.fold(user_id)))
    }

    fn normalize(&self) -> Result<NormalizeReport> {
        self.mutate(|doc| Ok(doc.normalize()))
    }
}
