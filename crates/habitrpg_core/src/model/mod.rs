//! Domain model for users, habits and completions.
//!
//! # Responsibility
//! - Define the records the engine reads and writes.
//! - Host the pure progression ledger.
//!
//! # Invariants
//! - Identifiers are random v4 UUIDs and never reused.
//! - Habits are soft-deleted; completions are never deleted.

pub mod completion;
pub mod habit;
pub mod progression;
pub mod user;
