//! Engine use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the engine operations.
//! - Own the error taxonomy callers map onto their transport.
//!
//! # Invariants
//! - Services only see repository traits and an injected `Clock`.
//! - Services never read the system time directly.

pub mod completion_service;
pub mod error;
pub mod habit_service;
pub mod stats_service;
pub mod streak;
pub mod user_service;
