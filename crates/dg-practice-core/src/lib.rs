//! Core types and utilities for dg-practice.
//!
//! This crate provides the foundational types used throughout the practice tracker:
//!
//! - **Identifiers**: `UserId`, `DiscId`, `RoutineId`, `SessionId`
//! - **Catalog**: `User`, `Disc`, `FlightNumbers`, `Routine`, `Manufacturer`
//! - **Sessions**: `Session`, `SessionMode`, `StationResult`, `DiscResult`
//! - **Stats**: `Tally`, `CircleStats`, `StatsSummary`, `percentage`
//! - **Recording**: `SessionRecorder`, `FormFields`, `InputPolicy`
//! - **Ledger**: `Aggregates`, `RollbackReport`, `daily_timeline`
//!
//! # Circles
//!
//! Every throw counts toward one of two target circles:
//!
//! - **Circle 1**: stations at a distance of 10 or less
//! - **Circle 2**: everything further out
//!
//! A `Session` is the ledger entry: it stores the exact deltas it applied, so the
//! cached per-disc and per-user aggregates can always be rebuilt by folding the
//! remaining sessions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod disc;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod lenient;
pub mod manufacturer;
pub mod recorder;
pub mod routine;
pub mod session;
pub mod stats;
pub mod user;

pub use disc::{Disc, FlightNumbers};
pub use error::{PracticeError, Result, ValidationError};
pub use ids::{DiscId, IdError, RoutineId, SessionId, UserId};
pub use ledger::{daily_timeline, Aggregates, ClampEvent, DailyStats, RollbackReport};
pub use manufacturer::{default_catalog, Manufacturer};
pub use recorder::{parse_count, FormFields, InputPolicy, SessionRecorder};
pub use routine::{parse_distances, Routine};
pub use session::{DiscResult, Session, SessionMode, StationResult};
pub use stats::{percentage, Circle, CircleStats, StatsSummary, Tally, TallySummary};
pub use user::User;

/// Ownership filter applied to every per-user query.
///
/// Discs, routines and sessions belong to exactly one user; every read and write
/// performed on behalf of a user is restricted with `belongs_to`.
pub trait Owned {
    /// The owning user.
    fn owner(&self) -> &UserId;

    /// Whether the entity is owned by `user_id`.
    fn belongs_to(&self, user_id: &UserId) -> bool {
        self.owner() == user_id
    }
}
