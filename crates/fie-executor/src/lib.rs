//! FIE Executor - The single entry point
//!
//! [`IntentExecutor`] wires the aggregator, trigger coordinator, execution
//! gate, sunset coordinator and audit trail together behind one lock:
//!
//! ```text
//! sources -> rounds -> activation -> decisions -> sunset
//! ```
//!
//! Configuration comes from [`FieConfig`]; [`telemetry::init_logging`]
//! installs the tracing subscriber for embedders that want one.

pub mod config;
pub mod error;
pub mod executor;
pub mod telemetry;

pub use config::{FieConfig, LoggingConfig};
pub use error::SetupError;
pub use executor::{Collaborators, IntentExecutor, Roles};
pub use telemetry::init_logging;

// Re-exports so embedders need only this crate
pub use fie_attestation::{AttestationDispatcher, RecordingDispatcher, ReputationPolicy, SubmitOutcome};
pub use fie_execution::{
    hash_corpus, ActionEffect, ActionRecord, ActionRequest, AssetLedger, CitationResolution, CitationService,
    InMemoryAssetLedger, Outcome, StaticCitationService,
};
pub use fie_sunset::{LicenseCategory, SunsetRecord, SUNSET_DURATION_SECS};
pub use fie_trigger::{Activation, ActivationState, StrategyKind, TriggerStrategy};
pub use fie_types::{ActorId, Clock, ErrorKind, FieError, ManualClock, PrincipalId, RoundId, SourceId, SystemClock};
