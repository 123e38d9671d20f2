//! Repository contracts and the SQLite store behind them.
//!
//! # Responsibility
//! - Define the storage operations the engine consumes.
//! - Keep SQL inside this module; services only see traits.
//!
//! # Invariants
//! - Semantic failures (`NotFound`, `Conflict`) are reported separately from
//!   transport errors.
//! - Multi-step writes go through `Transactional::atomically`.

pub mod completion_repo;
pub mod habit_repo;
pub mod store;
pub mod user_repo;
