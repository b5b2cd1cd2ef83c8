//! Aggregation rounds

use fie_types::{Confidence, PrincipalId, RoundId, SourceId, Timestamp, CONFIDENCE_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Upper bound on `required` for a single round
pub const MAX_ROUND_SOURCES: usize = 32;

/// One source's answer to a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub source_id: SourceId,
    pub verdict: bool,
    pub confidence: Confidence,
    pub submitted_at: Timestamp,
}

impl Submission {
    /// Counts toward the positive tally only with verdict=true at threshold confidence
    pub fn is_positive(&self) -> bool {
        self.verdict && self.confidence.meets_threshold()
    }
}

/// Reputation change applied to a responder at finalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationDelta {
    pub source_id: SourceId,
    pub delta: i16,
    pub reversed: bool,
}

/// A consensus request about one (principal, event type, evidence hash).
///
/// Every field is frozen once `completed` or `cancelled_at` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRound {
    pub id: RoundId,
    pub principal: PrincipalId,
    pub event_type: String,
    pub evidence_hash: String,
    pub required: usize,
    pub received: usize,
    pub positive: usize,
    /// Running mean, integer-truncated at every step
    pub mean_confidence: u8,
    pub completed: bool,
    pub valid: bool,
    /// Eligible sources snapshotted at open; only these may submit
    pub solicited: Vec<SourceId>,
    pub submissions: Vec<Submission>,
    pub deltas: Vec<ReputationDelta>,
    pub opened_at: Timestamp,
    pub finalized_at: Option<Timestamp>,
    /// Set by an admin cancel; a cancelled round never finalizes
    #[serde(default)]
    pub cancelled_at: Option<Timestamp>,
}

impl AggregationRound {
    pub(crate) fn new(
        principal: PrincipalId,
        event_type: String,
        evidence_hash: String,
        required: usize,
        solicited: Vec<SourceId>,
        opened_at: Timestamp,
    ) -> Self {
        Self {
            id: RoundId::new(),
            principal,
            event_type,
            evidence_hash,
            required,
            received: 0,
            positive: 0,
            mean_confidence: 0,
            completed: false,
            valid: false,
            solicited,
            submissions: Vec::new(),
            deltas: Vec::new(),
            opened_at,
            finalized_at: None,
            cancelled_at: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }

    /// Still accepting submissions
    pub fn is_pending(&self) -> bool {
        !self.completed && !self.is_cancelled()
    }

    pub fn has_submitted(&self, source_id: &SourceId) -> bool {
        self.submissions.iter().any(|s| &s.source_id == source_id)
    }

    pub fn was_solicited(&self, source_id: &SourceId) -> bool {
        self.solicited.contains(source_id)
    }

    /// Votes needed for a strict majority of `required`
    pub fn majority(&self) -> usize {
        self.required / 2 + 1
    }

    /// Record a submission and update the tallies.
    ///
    /// `mean' = (mean * (n - 1) + confidence) / n` with truncating division,
    /// so a borderline mean can land one unit below the exact average.
    pub(crate) fn record(&mut self, submission: Submission) {
        self.received += 1;
        let n = self.received as u32;
        let sum = self.mean_confidence as u32 * (n - 1) + submission.confidence.value() as u32;
        self.mean_confidence = (sum / n) as u8;
        if submission.is_positive() {
            self.positive += 1;
        }
        self.submissions.push(submission);
    }

    pub fn is_full(&self) -> bool {
        self.received == self.required
    }

    /// Consensus rule evaluated at finalization
    pub fn consensus(&self) -> bool {
        self.positive >= self.majority() && self.mean_confidence >= CONFIDENCE_THRESHOLD
    }

    pub fn matches(&self, principal: &PrincipalId, event_type: &str, evidence_hash: &str) -> bool {
        &self.principal == principal && self.event_type == event_type && self.evidence_hash == evidence_hash
    }
}
