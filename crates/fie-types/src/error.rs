//! Error types for the Finite Intent Executor
//!
//! All errors are explicit and every rejection leaves state unchanged.
//! Content-policy blocks and low confidence are decision outcomes, not errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for FIE operations
pub type Result<T> = std::result::Result<T, FieError>;

/// Broad classes of rejection, used by callers to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Wrong state; retryable once the precondition holds
    Precondition,
    /// Malformed input; the caller must correct it
    Validation,
    /// Caller lacks the role the operation requires
    Unauthorized,
    /// Not enough balance, sources or batch capacity
    ResourceExhausted,
    /// An external collaborator failed or returned inconsistent data
    External,
}

/// FIE error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieError {
    // ========================================================================
    // Precondition Errors
    // ========================================================================

    /// Principal has not been activated
    #[error("Principal {principal} is not activated")]
    NotActivated { principal: String },

    /// Principal has already been activated
    #[error("Principal {principal} is already activated")]
    AlreadyActivated { principal: String },

    /// No trigger has been configured
    #[error("Principal {principal} has no trigger configured")]
    TriggerNotConfigured { principal: String },

    /// The configured strategy does not support this call
    #[error("Trigger strategy mismatch: configured {configured}, call requires {required}")]
    StrategyMismatch { configured: String, required: String },

    /// Inactivity deadline has not been reached
    #[error("Inactivity deadline {deadline} not reached (now {now})")]
    InactivityNotElapsed { deadline: i64, now: i64 },

    /// Round already completed
    #[error("Round {round_id} is already completed")]
    RoundCompleted { round_id: String },

    /// Identical round already pending
    #[error("A round for this event is already pending: {round_id}")]
    RoundAlreadyPending { round_id: String },

    /// Round not yet completed
    #[error("Round {round_id} is not completed")]
    RoundNotCompleted { round_id: String },

    /// Round was cancelled before it filled
    #[error("Round {round_id} was cancelled")]
    RoundCancelled { round_id: String },

    /// Source already registered
    #[error("Source {source_id} is already registered")]
    SourceAlreadyRegistered { source_id: String },

    /// Source is in the wrong active state for this call
    #[error("Source {source_id} active state is already {active}")]
    SourceActiveState { source_id: String, active: bool },

    /// Dispute window closed
    #[error("Dispute window for round {round_id} closed at {closed_at}")]
    DisputeWindowClosed { round_id: String, closed_at: i64 },

    /// Nothing to reverse for this source in this round
    #[error("No reversible penalty for source {source_id} in round {round_id}")]
    NothingToReverse { round_id: String, source_id: String },

    /// Execution has been halted by sunset
    #[error("Execution for principal {principal} is halted by sunset")]
    ExecutionHalted { principal: String },

    /// Corpus already registered
    #[error("Corpus for principal {principal} is already registered")]
    CorpusAlreadyRegistered { principal: String },

    /// Corpus not registered
    #[error("Corpus for principal {principal} is not registered")]
    CorpusNotRegistered { principal: String },

    /// Sunset deadline not reached
    #[error("Sunset not due until {due_at} (now {now})")]
    SunsetNotDue { due_at: i64, now: i64 },

    /// Sunset step attempted out of order
    #[error("Sunset step {attempted} requires {required}")]
    SunsetOutOfOrder { attempted: String, required: String },

    /// Sunset step already done
    #[error("Sunset step {step} already performed")]
    SunsetStepRepeated { step: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Confidence outside [0, 100]
    #[error("Confidence {value} outside [0, 100]")]
    InvalidConfidence { value: u8 },

    /// Generic invalid input
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Invalid policy configuration
    #[error("Invalid policy: {reason}")]
    InvalidPolicy { reason: String },

    /// Unknown attestation source
    #[error("Source {source_id} not found")]
    SourceNotFound { source_id: String },

    /// Unknown round
    #[error("Round {round_id} not found")]
    RoundNotFound { round_id: String },

    /// Unknown action record
    #[error("Action {action_id} not found")]
    ActionNotFound { action_id: String },

    /// Source already submitted to this round
    #[error("Source {source_id} already submitted to round {round_id}")]
    DuplicateSubmission { round_id: String, source_id: String },

    /// Source was not solicited by this round
    #[error("Source {source_id} was not solicited by round {round_id}")]
    SourceNotSolicited { round_id: String, source_id: String },

    /// Party already signed
    #[error("Party {party} already signed for principal {principal}")]
    DuplicateSignature { principal: String, party: String },

    /// Caller-supplied evidence does not match the registered corpus
    #[error("Evidence hash mismatch: expected {expected}, got {actual}")]
    EvidenceMismatch { expected: String, actual: String },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    /// Caller lacks the required role
    #[error("Actor {actor} is not authorized to {action}")]
    Unauthorized { actor: String, action: String },

    /// Unverified single-reporter fallback is compiled out or disabled
    #[error("Unverified reporter fallback is disabled")]
    FallbackDisabled,

    // ========================================================================
    // Resource Errors
    // ========================================================================

    /// Not enough eligible sources to open a round
    #[error("Insufficient eligible sources: need {required}, have {available}")]
    InsufficientEligibleSources { required: usize, available: usize },

    /// Not enough balance for a value-moving action
    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    /// Archive batch exceeds the per-call bound
    #[error("Batch of {size} items exceeds maximum {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Balance arithmetic overflow
    #[error("Balance overflow")]
    BalanceOverflow,

    // ========================================================================
    // External Errors
    // ========================================================================

    /// Citation service failed
    #[error("Citation service error: {message}")]
    CitationService { message: String },

    /// Citation service answered from a different corpus
    #[error("Corpus hash mismatch: expected {expected}, service reported {actual}")]
    CorpusHashMismatch { expected: String, actual: String },

    /// Citation service returned malformed data
    #[error("Citation integrity failure: {reason}")]
    CitationIntegrity { reason: String },

    /// Asset ledger failed
    #[error("Asset ledger error: {message}")]
    AssetLedger { message: String },
}

impl FieError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        use FieError::*;
        match self {
            NotActivated { .. }
            | AlreadyActivated { .. }
            | TriggerNotConfigured { .. }
            | StrategyMismatch { .. }
            | InactivityNotElapsed { .. }
            | RoundCompleted { .. }
            | RoundAlreadyPending { .. }
            | RoundNotCompleted { .. }
            | RoundCancelled { .. }
            | SourceAlreadyRegistered { .. }
            | SourceActiveState { .. }
            | DisputeWindowClosed { .. }
            | NothingToReverse { .. }
            | ExecutionHalted { .. }
            | CorpusAlreadyRegistered { .. }
            | CorpusNotRegistered { .. }
            | SunsetNotDue { .. }
            | SunsetOutOfOrder { .. }
            | SunsetStepRepeated { .. } => ErrorKind::Precondition,

            InvalidConfidence { .. }
            | InvalidInput { .. }
            | InvalidPolicy { .. }
            | SourceNotFound { .. }
            | RoundNotFound { .. }
            | ActionNotFound { .. }
            | DuplicateSubmission { .. }
            | SourceNotSolicited { .. }
            | DuplicateSignature { .. }
            | EvidenceMismatch { .. } => ErrorKind::Validation,

            Unauthorized { .. } | FallbackDisabled => ErrorKind::Unauthorized,

            InsufficientEligibleSources { .. }
            | InsufficientBalance { .. }
            | BatchTooLarge { .. }
            | BalanceOverflow => ErrorKind::ResourceExhausted,

            CitationService { .. }
            | CorpusHashMismatch { .. }
            | CitationIntegrity { .. }
            | AssetLedger { .. } => ErrorKind::External,
        }
    }

    /// Whether retrying after the state changes can succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FieError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unauthorized(actor: impl ToString, action: impl Into<String>) -> Self {
        FieError::Unauthorized {
            actor: actor.to_string(),
            action: action.into(),
        }
    }
}
