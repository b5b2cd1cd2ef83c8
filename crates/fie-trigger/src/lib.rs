//! FIE Trigger - Once-only activation
//!
//! A principal configures exactly one of three strategies:
//!
//! - **InactivityTimeout**: anyone may fire once the principal has not
//!   checked in for the configured interval
//! - **Quorum**: a fixed roster signs; the signature that crosses the
//!   threshold activates inside the same call
//! - **AttestedEvent**: a valid aggregation round for the configured event
//!   type activates
//!
//! Activation is terminal and happens at most once per principal.

pub mod coordinator;
pub mod strategy;

pub use coordinator::{Activation, ActivationRecord, ActivationState, TriggerCoordinator, TriggerPolicy};
pub use strategy::{StrategyKind, TriggerStrategy, DEFAULT_MIN_INACTIVITY_SECS};
