//! FIE Types - Canonical domain types for the Finite Intent Executor
//!
//! This crate contains the foundational types shared by every other fie crate,
//! with zero dependencies on them:
//!
//! - Identity types (ActorId, SourceId, RoundId, ActionId)
//! - Time (unix-second timestamps, injectable clocks, fixed durations)
//! - Confidence scores and the build-time execution threshold
//! - The error taxonomy shared by all components
//!
//! # Architectural Invariants
//!
//! 1. Activation happens at most once per principal
//! 2. Content policy outranks any evidentiary score
//! 3. Low confidence defaults to inaction, it is never an error
//! 4. The mandate ends at a fixed time regardless of operator behavior
//! 5. Every rejection leaves state unchanged

pub mod confidence;
pub mod error;
pub mod identity;
pub mod time;

pub use confidence::*;
pub use error::*;
pub use identity::*;
pub use time::*;

/// Version of the FIE types schema
pub const TYPES_VERSION: &str = "0.1.0";
