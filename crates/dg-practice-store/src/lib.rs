//! JSON document storage layer for dg-practice.
//!
//! All state lives in one JSON document (see [`document`]). [`JsonStore`] keeps it
//! in memory behind a single lock and replaces the file atomically on every
//! mutation, so each operation below is one transaction.
//!
//! Every per-user read and write is filtered by owner: a record belonging to
//! another user is reported exactly like a missing one.
//!
//! # Example
//!
//! ```no_run
//! use dg_practice_store::{JsonStore, Store};
//! use dg_practice_core::{Routine, UserId};
//!
//! let store = JsonStore::open("data/db.json").unwrap();
//!
//! let user_id = UserId::generate();
//! let routine = Routine::new(user_id, "Ladder", vec![7.0, 12.0, 15.0]).unwrap();
//! store.put_routine(&routine).unwrap();
//!
//! let stats = store.get_user_stats(&user_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod document;
pub mod error;
pub mod fs;
pub mod json;

pub use document::{Document, NormalizeReport};
pub use error::{Result, StoreError};
pub use json::JsonStore;

use dg_practice_core::{
    Aggregates, CircleStats, Disc, DiscId, Manufacturer, RollbackReport, Routine, RoutineId,
    Session, SessionId, User, UserId,
};

/// The storage trait defining all persistence operations.
///
/// This trait abstracts the storage layer so the service can run against a file
/// or an in-memory document.
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username or email is already taken
    /// (case-insensitive).
    fn create_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Find a user by username or email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Replace an existing user record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::Conflict` if the new username or email is taken.
    fn update_user(&self, user: &User) -> Result<()>;

    // =========================================================================
    // Disc Operations
    // =========================================================================

    /// Insert or update a disc.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the disc ID exists under another user.
    fn put_disc(&self, disc: &Disc) -> Result<()>;

    /// Get one of the user's discs.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_disc(&self, user_id: &UserId, disc_id: &DiscId) -> Result<Option<Disc>>;

    /// List the user's discs, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_discs_by_user(&self, user_id: &UserId) -> Result<Vec<Disc>>;

    /// Delete one of the user's discs and its stats.
    ///
    /// Sessions that used the disc are kept.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user has no such disc.
    fn delete_disc(&self, user_id: &UserId, disc_id: &DiscId) -> Result<()>;

    // =========================================================================
    // Routine Operations
    // =========================================================================

    /// Insert or update a routine.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the routine ID exists under another user.
    fn put_routine(&self, routine: &Routine) -> Result<()>;

    /// Get one of the user's routines.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_routine(&self, user_id: &UserId, routine_id: &RoutineId) -> Result<Option<Routine>>;

    /// List the user's routines, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_routines_by_user(&self, user_id: &UserId) -> Result<Vec<Routine>>;

    /// Delete one of the user's routines. Recorded sessions are kept.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user has no such routine.
    fn delete_routine(&self, user_id: &UserId, routine_id: &RoutineId) -> Result<()>;

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// List the user's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_sessions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Session>>;

    /// Count the user's sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn count_sessions_by_user(&self, user_id: &UserId) -> Result<usize>;

    /// Get one of the user's sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<Option<Session>>;

    // =========================================================================
    // Stats Operations
    // =========================================================================

    /// The user's cached overall stats (zero if none).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_user_stats(&self, user_id: &UserId) -> Result<CircleStats>;

    /// Cached stats of one of the user's discs (zero if none).
    ///
    /// Returns `None` if the user has no such disc.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_disc_stats(&self, user_id: &UserId, disc_id: &DiscId) -> Result<Option<CircleStats>>;

    // =========================================================================
    // Manufacturer Operations
    // =========================================================================

    /// List the manufacturer catalog, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_manufacturers(&self) -> Result<Vec<Manufacturer>>;

    /// Upsert catalog entries by ID.
    ///
    /// Returns the number of entries that were new.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn seed_manufacturers(&self, manufacturers: &[Manufacturer]) -> Result<usize>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Append a session and apply its deltas atomically.
    ///
    /// Returns the user's overall stats after the update.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if a disc in the session is not owned by its user.
    /// - `StoreError::Conflict` if the session ID already exists.
    fn record_session(&self, session: &Session) -> Result<CircleStats>;

    /// Roll back a session's deltas and remove it atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user has no such session.
    fn delete_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<RollbackReport>;

    /// Recompute the user's aggregates from their sessions and persist them.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn rebuild_stats(&self, user_id: &UserId) -> Result<Aggregates>;

    /// Whether the user's cached aggregates match their sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn verify_stats(&self, user_id: &UserId) -> Result<bool>;

    /// Rebuild every user's aggregates and drop stats of deleted discs.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn normalize(&self) -> Result<NormalizeReport>;
}
