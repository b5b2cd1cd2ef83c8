//! FIE Audit - Immutable audit trail
//!
//! Every successful state-changing operation produces one audit entry. The
//! trail is append-only and each entry commits to its predecessor's hash, so
//! any edit to history is detectable with [`AuditTrail::verify_chain`].

use fie_types::{ActionId, ActorId, PrincipalId, RoundId, SourceId, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash used as `previous_hash` of the first entry
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Auditable events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    SourceRegistered { source_id: SourceId },
    SourceDeactivated { source_id: SourceId },
    SourceReactivated { source_id: SourceId },
    ReputationReset { source_id: SourceId },
    PenaltyReversed { round_id: RoundId, source_id: SourceId },
    RoundOpened { round_id: RoundId },
    AttestationSubmitted { round_id: RoundId, source_id: SourceId },
    RoundFinalized { round_id: RoundId, valid: bool },
    RoundCancelled { round_id: RoundId },
    TriggerConfigured { strategy: String },
    CheckedIn,
    SignatureSubmitted { party: ActorId },
    Activated { strategy: String },
    CorpusRegistered { corpus_hash: String },
    Deposited { amount: u64 },
    ActionDecided { action_id: ActionId, outcome: String },
    SunsetInitiated,
    ArchiveBatch { items: usize },
    ArchiveFinalized,
    Relicensed { license: String },
    Clustered { cluster_id: String },
    SunsetCompleted,
}

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the trail, starting at 0
    pub sequence: u64,
    /// Previous entry hash (for chain)
    pub previous_hash: String,
    /// Entry hash
    pub hash: String,
    pub timestamp: Timestamp,
    pub actor: Option<ActorId>,
    pub principal: Option<PrincipalId>,
    pub event: AuditEvent,
}

impl AuditEntry {
    /// Compute hash of this entry
    pub fn compute_hash(&self) -> String {
        let event = serde_json::to_string(&self.event).unwrap_or_default();
        let content = format!(
            "{}:{}:{}:{:?}:{:?}:{}",
            self.sequence, self.previous_hash, self.timestamp, self.actor, self.principal, event
        );
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify the entry hash
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// In-memory append-only audit trail
#[derive(Debug, Default, Clone)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number
    pub fn append(
        &mut self,
        timestamp: Timestamp,
        actor: Option<&ActorId>,
        principal: Option<&PrincipalId>,
        event: AuditEvent,
    ) -> u64 {
        let sequence = self.entries.len() as u64;
        let previous_hash = self
            .entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut entry = AuditEntry {
            sequence,
            previous_hash,
            hash: String::new(),
            timestamp,
            actor: actor.cloned(),
            principal: principal.cloned(),
            event,
        };
        entry.hash = entry.compute_hash();
        self.entries.push(entry);
        sequence
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    /// Entries concerning one principal, in order
    pub fn for_principal(&self, principal: &PrincipalId) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.principal.as_ref() == Some(principal))
            .collect()
    }

    /// Verify every hash and every back-link
    pub fn verify_chain(&self) -> bool {
        let mut expected_previous = GENESIS_HASH;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.sequence != i as u64 || entry.previous_hash != expected_previous || !entry.verify() {
                return false;
            }
            expected_previous = entry.hash.as_str();
        }
        true
    }
}
