//! FIE Attestation - Multi-source consensus on real-world events
//!
//! A round asks every eligible source whether an event happened for a
//! principal. It finalizes synchronously inside the submission that brings
//! `received` up to `required`:
//!
//! ```text
//! valid = positive >= required / 2 + 1 && mean_confidence >= 95
//! ```
//!
//! where a submission is positive only if `verdict && confidence >= 95`, and
//! `mean_confidence` is a running mean truncated at every step. Responders
//! then gain or lose reputation depending on whether their verdict matched
//! the outcome. Reputation never drops below the policy floor.

pub mod aggregator;
pub mod dispatch;
pub mod round;
pub mod source;

pub use aggregator::{AttestationAggregator, SubmitOutcome};
pub use dispatch::{AttestationDispatcher, AttestationRequest, DispatchError, RecordingDispatcher};
pub use round::{AggregationRound, ReputationDelta, Submission, MAX_ROUND_SOURCES};
pub use source::{AttestationSource, ReputationPolicy, MAX_REPUTATION};
