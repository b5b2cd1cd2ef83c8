//! Outbound attestation requests

use std::collections::HashSet;

use fie_types::{PrincipalId, RoundId, SourceId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a source is asked to attest to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRequest {
    pub round_id: RoundId,
    pub principal: PrincipalId,
    pub event_type: String,
    pub evidence_hash: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dispatch to {source_id} failed: {message}")]
pub struct DispatchError {
    pub source_id: String,
    pub message: String,
}

/// Delivers attestation requests to sources. One failure must not stop the rest.
pub trait AttestationDispatcher: Send + Sync {
    fn dispatch(&self, source: &SourceId, request: &AttestationRequest) -> Result<(), DispatchError>;
}

/// Dispatcher that only records what it was asked to send
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(SourceId, AttestationRequest)>>,
    unreachable: Mutex<HashSet<SourceId>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future dispatch to `source` fail
    pub fn mark_unreachable(&self, source: SourceId) {
        self.unreachable.lock().insert(source);
    }

    pub fn sent(&self) -> Vec<(SourceId, AttestationRequest)> {
        self.sent.lock().clone()
    }

    pub fn sent_for(&self, round_id: &RoundId) -> Vec<SourceId> {
        self.sent
            .lock()
            .iter()
            .filter(|(_, r)| &r.round_id == round_id)
            .map(|(s, _)| s.clone())
            .collect()
    }
}

impl AttestationDispatcher for RecordingDispatcher {
    fn dispatch(&self, source: &SourceId, request: &AttestationRequest) -> Result<(), DispatchError> {
        if self.unreachable.lock().contains(source) {
            return Err(DispatchError {
                source_id: source.to_string(),
                message: "unreachable".to_string(),
            });
        }
        self.sent.lock().push((source.clone(), request.clone()));
        Ok(())
    }
}
