//! The attestation aggregator
//!
//! Owns the source registry and every round. Rounds finalize synchronously
//! inside the submission that fills them.

use std::collections::BTreeMap;
use std::sync::Arc;

use fie_types::{ActorId, Confidence, FieError, PrincipalId, Result, RoundId, SourceId, Timestamp};
use tracing::{debug, info, warn};

use crate::dispatch::{AttestationDispatcher, AttestationRequest};
use crate::round::{AggregationRound, ReputationDelta, Submission, MAX_ROUND_SOURCES};
use crate::source::{AttestationSource, ReputationPolicy};

/// Result of a single submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Round still waiting for more responses
    Pending { received: usize, required: usize },
    /// This submission filled the round
    Finalized { valid: bool, mean_confidence: u8 },
}

pub struct AttestationAggregator {
    policy: ReputationPolicy,
    admin: ActorId,
    dispatcher: Arc<dyn AttestationDispatcher>,
    sources: BTreeMap<SourceId, AttestationSource>,
    rounds: BTreeMap<RoundId, AggregationRound>,
}

impl AttestationAggregator {
    pub fn new(
        policy: ReputationPolicy,
        admin: ActorId,
        dispatcher: Arc<dyn AttestationDispatcher>,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            admin,
            dispatcher,
            sources: BTreeMap::new(),
            rounds: BTreeMap::new(),
        })
    }

    pub fn policy(&self) -> &ReputationPolicy {
        &self.policy
    }

    pub fn admin(&self) -> &ActorId {
        &self.admin
    }

    fn require_admin(&self, caller: &ActorId, action: &str) -> Result<()> {
        if caller != &self.admin {
            return Err(FieError::unauthorized(caller, action));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Source registry
    // ------------------------------------------------------------------

    pub fn register_source(&mut self, caller: &ActorId, source_id: SourceId, now: Timestamp) -> Result<()> {
        self.require_admin(caller, "register sources")?;
        if self.sources.contains_key(&source_id) {
            return Err(FieError::SourceAlreadyRegistered {
                source_id: source_id.to_string(),
            });
        }
        info!(source = %source_id, reputation = self.policy.initial, "attestation source registered");
        let source = AttestationSource::new(source_id.clone(), &self.policy, now);
        self.sources.insert(source_id, source);
        Ok(())
    }

    pub fn deactivate_source(&mut self, caller: &ActorId, source_id: &SourceId) -> Result<()> {
        self.set_active(caller, source_id, false)
    }

    pub fn reactivate_source(&mut self, caller: &ActorId, source_id: &SourceId) -> Result<()> {
        self.set_active(caller, source_id, true)
    }

    fn set_active(&mut self, caller: &ActorId, source_id: &SourceId, active: bool) -> Result<()> {
        self.require_admin(caller, "change source activation")?;
        let source = self.source_mut(source_id)?;
        if source.active == active {
            return Err(FieError::SourceActiveState {
                source_id: source_id.to_string(),
                active,
            });
        }
        source.active = active;
        info!(source = %source_id, active, "attestation source activation changed");
        Ok(())
    }

    /// Restore a source to the initial reputation
    pub fn reset_reputation(&mut self, caller: &ActorId, source_id: &SourceId) -> Result<()> {
        self.require_admin(caller, "reset reputation")?;
        let initial = self.policy.initial;
        let source = self.source_mut(source_id)?;
        let before = source.reputation;
        source.reputation = initial;
        info!(source = %source_id, before, after = initial, "source reputation reset");
        Ok(())
    }

    /// Refund the penalty a source took in a finalized round, inside the dispute window
    pub fn reverse_penalty(
        &mut self,
        caller: &ActorId,
        round_id: &RoundId,
        source_id: &SourceId,
        now: Timestamp,
    ) -> Result<()> {
        self.require_admin(caller, "reverse penalties")?;
        let window = self.policy.dispute_window_secs;
        let round = self.round_ref(round_id)?;
        let finalized_at = round.finalized_at.ok_or_else(|| FieError::RoundNotCompleted {
            round_id: round_id.to_string(),
        })?;
        let closes_at = finalized_at.saturating_add(window);
        if now > closes_at {
            return Err(FieError::DisputeWindowClosed {
                round_id: round_id.to_string(),
                closed_at: closes_at,
            });
        }
        let index = round
            .deltas
            .iter()
            .position(|d| &d.source_id == source_id && d.delta < 0 && !d.reversed)
            .ok_or_else(|| FieError::NothingToReverse {
                round_id: round_id.to_string(),
                source_id: source_id.to_string(),
            })?;
        let refund = -round.deltas[index].delta;
        if !self.sources.contains_key(source_id) {
            return Err(FieError::SourceNotFound {
                source_id: source_id.to_string(),
            });
        }

        // validated; mutate
        if let Some(round) = self.rounds.get_mut(round_id) {
            round.deltas[index].reversed = true;
        }
        let source = self.source_mut(source_id)?;
        source.reputation = (source.reputation as i16 + refund).min(crate::source::MAX_REPUTATION as i16) as u8;
        source.disagreements = source.disagreements.saturating_sub(1);
        source.agreements += 1;
        info!(round = %round_id, source = %source_id, refund, "penalty reversed after dispute");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rounds
    // ------------------------------------------------------------------

    /// Open a round and dispatch it to every eligible source
    pub fn open(
        &mut self,
        principal: PrincipalId,
        event_type: &str,
        evidence_hash: &str,
        required: usize,
        now: Timestamp,
    ) -> Result<RoundId> {
        if event_type.trim().is_empty() {
            return Err(FieError::invalid_input("event_type", "must not be empty"));
        }
        if evidence_hash.trim().is_empty() {
            return Err(FieError::invalid_input("evidence_hash", "must not be empty"));
        }
        if required == 0 || required > MAX_ROUND_SOURCES {
            return Err(FieError::invalid_input(
                "required_sources",
                format!("must be in 1..={}", MAX_ROUND_SOURCES),
            ));
        }
        if let Some(pending) = self
            .rounds
            .values()
            .find(|r| r.is_pending() && r.matches(&principal, event_type, evidence_hash))
        {
            return Err(FieError::RoundAlreadyPending {
                round_id: pending.id.to_string(),
            });
        }

        let eligible = self.eligible_sources();
        if eligible.len() < required {
            warn!(required, available = eligible.len(), "not enough eligible attestation sources");
            return Err(FieError::InsufficientEligibleSources {
                required,
                available: eligible.len(),
            });
        }

        let round = AggregationRound::new(
            principal.clone(),
            event_type.to_string(),
            evidence_hash.to_string(),
            required,
            eligible.clone(),
            now,
        );
        let round_id = round.id.clone();
        self.rounds.insert(round_id.clone(), round);
        info!(round = %round_id, principal = %principal, event_type, required, solicited = eligible.len(), "aggregation round opened");

        let request = AttestationRequest {
            round_id: round_id.clone(),
            principal,
            event_type: event_type.to_string(),
            evidence_hash: evidence_hash.to_string(),
        };
        for source in &eligible {
            if let Err(e) = self.dispatcher.dispatch(source, &request) {
                warn!(round = %round_id, source = %source, error = %e, "attestation dispatch failed; continuing");
            }
        }

        Ok(round_id)
    }

    /// Record one source's verdict; finalizes the round when it fills
    pub fn submit(
        &mut self,
        round_id: &RoundId,
        source_id: &SourceId,
        verdict: bool,
        confidence: u8,
        now: Timestamp,
    ) -> Result<SubmitOutcome> {
        let confidence = Confidence::new(confidence)?;
        let round = self.round_ref(round_id)?;
        if round.completed {
            return Err(FieError::RoundCompleted {
                round_id: round_id.to_string(),
            });
        }
        if round.is_cancelled() {
            return Err(FieError::RoundCancelled {
                round_id: round_id.to_string(),
            });
        }
        let source = self.sources.get(source_id).ok_or_else(|| FieError::SourceNotFound {
            source_id: source_id.to_string(),
        })?;
        if !round.was_solicited(source_id) {
            return Err(FieError::SourceNotSolicited {
                round_id: round_id.to_string(),
                source_id: source_id.to_string(),
            });
        }
        if round.has_submitted(source_id) {
            return Err(FieError::DuplicateSubmission {
                round_id: round_id.to_string(),
                source_id: source_id.to_string(),
            });
        }
        if !source.active {
            return Err(FieError::SourceActiveState {
                source_id: source_id.to_string(),
                active: false,
            });
        }

        let round = self.rounds.get_mut(round_id).ok_or_else(|| FieError::RoundNotFound {
            round_id: round_id.to_string(),
        })?;
        round.record(Submission {
            source_id: source_id.clone(),
            verdict,
            confidence,
            submitted_at: now,
        });
        debug!(round = %round_id, source = %source_id, verdict, confidence = %confidence, received = round.received, "attestation recorded");

        if !round.is_full() {
            return Ok(SubmitOutcome::Pending {
                received: round.received,
                required: round.required,
            });
        }
        Ok(self.finalize(round_id, now))
    }

    /// Abandon a pending round. The round is kept for the record, applies no
    /// reputation changes, and frees its event for a fresh `open`.
    pub fn cancel_round(&mut self, caller: &ActorId, round_id: &RoundId, now: Timestamp) -> Result<()> {
        self.require_admin(caller, "cancel rounds")?;
        let round = self.rounds.get_mut(round_id).ok_or_else(|| FieError::RoundNotFound {
            round_id: round_id.to_string(),
        })?;
        if round.completed {
            return Err(FieError::RoundCompleted {
                round_id: round_id.to_string(),
            });
        }
        if round.is_cancelled() {
            return Err(FieError::RoundCancelled {
                round_id: round_id.to_string(),
            });
        }
        round.cancelled_at = Some(now);
        info!(round = %round_id, received = round.received, required = round.required, "aggregation round cancelled");
        Ok(())
    }

    fn finalize(&mut self, round_id: &RoundId, now: Timestamp) -> SubmitOutcome {
        let Some(round) = self.rounds.get_mut(round_id) else {
            return SubmitOutcome::Pending {
                received: 0,
                required: 0,
            };
        };
        round.valid = round.consensus();
        round.completed = true;
        round.finalized_at = Some(now);

        let mut deltas = Vec::with_capacity(round.submissions.len());
        for submission in &round.submissions {
            let Some(source) = self.sources.get_mut(&submission.source_id) else {
                continue;
            };
            let delta = if submission.verdict == round.valid {
                source.record_agreement(&self.policy)
            } else {
                source.record_disagreement(&self.policy)
            };
            if source.reputation < self.policy.participation_floor {
                warn!(source = %source.id, reputation = source.reputation, "source fell below participation floor");
            }
            deltas.push(ReputationDelta {
                source_id: submission.source_id.clone(),
                delta,
                reversed: false,
            });
        }
        round.deltas = deltas;

        info!(
            round = %round_id,
            valid = round.valid,
            positive = round.positive,
            mean_confidence = round.mean_confidence,
            "aggregation round finalized"
        );
        SubmitOutcome::Finalized {
            valid: round.valid,
            mean_confidence: round.mean_confidence,
        }
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    pub fn source(&self, source_id: &SourceId) -> Option<&AttestationSource> {
        self.sources.get(source_id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &AttestationSource> {
        self.sources.values()
    }

    pub fn round(&self, round_id: &RoundId) -> Option<&AggregationRound> {
        self.rounds.get(round_id)
    }

    pub fn rounds_for(&self, principal: &PrincipalId) -> Vec<&AggregationRound> {
        self.rounds.values().filter(|r| &r.principal == principal).collect()
    }

    /// Active sources at or above the participation floor, in id order
    pub fn eligible_sources(&self) -> Vec<SourceId> {
        self.sources
            .values()
            .filter(|s| s.is_eligible(&self.policy))
            .map(|s| s.id.clone())
            .collect()
    }

    fn round_ref(&self, round_id: &RoundId) -> Result<&AggregationRound> {
        self.rounds.get(round_id).ok_or_else(|| FieError::RoundNotFound {
            round_id: round_id.to_string(),
        })
    }

    fn source_mut(&mut self, source_id: &SourceId) -> Result<&mut AttestationSource> {
        self.sources.get_mut(source_id).ok_or_else(|| FieError::SourceNotFound {
            source_id: source_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RecordingDispatcher;

    struct Fixture {
        agg: AttestationAggregator,
        admin: ActorId,
        dispatcher: Arc<RecordingDispatcher>,
        sources: Vec<SourceId>,
    }

    fn fixture(n: usize, policy: ReputationPolicy) -> Fixture {
        let admin = ActorId::new();
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let mut agg = AttestationAggregator::new(policy, admin.clone(), dispatcher.clone()).unwrap();
        let mut sources = Vec::new();
        for _ in 0..n {
            let id = SourceId::new();
            agg.register_source(&admin, id.clone(), 0).unwrap();
            sources.push(id);
        }
        Fixture {
            agg,
            admin,
            dispatcher,
            sources,
        }
    }

    #[test]
    fn test_open_requires_enough_eligible_sources() {
        let mut f = fixture(2, ReputationPolicy::default());
        let err = f.agg.open(PrincipalId::new(), "death", "h", 3, 0).unwrap_err();
        assert_eq!(
            err,
            FieError::InsufficientEligibleSources {
                required: 3,
                available: 2
            }
        );
        assert!(f.agg.rounds_for(&PrincipalId::new()).is_empty());
        assert!(f.dispatcher.sent().is_empty());
    }

    #[test]
    fn test_dispatch_failure_does_not_block_others() {
        let mut f = fixture(3, ReputationPolicy::default());
        f.dispatcher.mark_unreachable(f.sources[1].clone());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 2, 0).unwrap();

        let sent = f.dispatcher.sent_for(&round_id);
        assert_eq!(sent.len(), 2);
        assert!(!sent.contains(&f.sources[1]));
        // the unreachable source was still solicited and may answer out of band
        assert_eq!(f.agg.round(&round_id).unwrap().solicited.len(), 3);
    }

    #[test]
    fn test_finalizes_exactly_at_required() {
        let mut f = fixture(4, ReputationPolicy::default());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 3, 0).unwrap();

        let out = f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();
        assert_eq!(out, SubmitOutcome::Pending { received: 1, required: 3 });
        f.agg.submit(&round_id, &f.sources[1], true, 97, 2).unwrap();
        let out = f.agg.submit(&round_id, &f.sources[2], true, 96, 3).unwrap();
        assert_eq!(out, SubmitOutcome::Finalized { valid: true, mean_confidence: 97 });

        let err = f.agg.submit(&round_id, &f.sources[3], true, 99, 4).unwrap_err();
        assert!(matches!(err, FieError::RoundCompleted { .. }));
        let round = f.agg.round(&round_id).unwrap();
        assert_eq!(round.received, 3);
        assert_eq!(round.finalized_at, Some(3));
    }

    #[test]
    fn test_rejects_duplicate_and_invalid_submissions() {
        let mut f = fixture(3, ReputationPolicy::default());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 3, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();

        let err = f.agg.submit(&round_id, &f.sources[0], false, 10, 2).unwrap_err();
        assert!(matches!(err, FieError::DuplicateSubmission { .. }));
        let err = f.agg.submit(&round_id, &f.sources[1], true, 101, 2).unwrap_err();
        assert!(matches!(err, FieError::InvalidConfidence { value: 101 }));
        let err = f.agg.submit(&round_id, &SourceId::new(), true, 99, 2).unwrap_err();
        assert!(matches!(err, FieError::SourceNotFound { .. }));

        let round = f.agg.round(&round_id).unwrap();
        assert_eq!(round.received, 1);
        assert!(round.submissions[0].verdict);
    }

    #[test]
    fn test_late_registered_source_not_solicited() {
        let mut f = fixture(2, ReputationPolicy::default());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 2, 0).unwrap();
        let late = SourceId::new();
        f.agg.register_source(&f.admin, late.clone(), 1).unwrap();
        let err = f.agg.submit(&round_id, &late, true, 99, 2).unwrap_err();
        assert!(matches!(err, FieError::SourceNotSolicited { .. }));
    }

    #[test]
    fn test_duplicate_pending_round_rejected() {
        let mut f = fixture(3, ReputationPolicy::default());
        let principal = PrincipalId::new();
        f.agg.open(principal.clone(), "death", "h", 2, 0).unwrap();
        let err = f.agg.open(principal.clone(), "death", "h", 2, 0).unwrap_err();
        assert!(matches!(err, FieError::RoundAlreadyPending { .. }));
        // different evidence is a different round
        assert!(f.agg.open(principal, "death", "h2", 2, 0).is_ok());
    }

    #[test]
    fn test_cancel_frees_round_stuck_on_deactivated_source() {
        let mut f = fixture(3, ReputationPolicy::default());
        let principal = PrincipalId::new();
        let round_id = f.agg.open(principal.clone(), "death", "h", 3, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[1], true, 99, 2).unwrap();
        f.agg.deactivate_source(&f.admin, &f.sources[2]).unwrap();
        let err = f.agg.submit(&round_id, &f.sources[2], true, 99, 3).unwrap_err();
        assert!(matches!(err, FieError::SourceActiveState { active: false, .. }));
        let err = f.agg.open(principal.clone(), "death", "h", 3, 3).unwrap_err();
        assert!(matches!(err, FieError::RoundAlreadyPending { .. }));

        let stranger = ActorId::new();
        let err = f.agg.cancel_round(&stranger, &round_id, 4).unwrap_err();
        assert!(matches!(err, FieError::Unauthorized { .. }));

        let before: Vec<u8> = f.sources.iter().map(|s| f.agg.source(s).unwrap().reputation).collect();
        f.agg.cancel_round(&f.admin, &round_id, 4).unwrap();
        let round = f.agg.round(&round_id).unwrap();
        assert_eq!(round.cancelled_at, Some(4));
        assert!(!round.completed);
        assert!(!round.is_pending());
        assert!(round.deltas.is_empty());
        let after: Vec<u8> = f.sources.iter().map(|s| f.agg.source(s).unwrap().reputation).collect();
        assert_eq!(before, after);

        let err = f.agg.submit(&round_id, &f.sources[1], true, 99, 5).unwrap_err();
        assert!(matches!(err, FieError::RoundCancelled { .. }));
        let err = f.agg.cancel_round(&f.admin, &round_id, 5).unwrap_err();
        assert!(matches!(err, FieError::RoundCancelled { .. }));

        f.agg.reactivate_source(&f.admin, &f.sources[2]).unwrap();
        let reopened = f.agg.open(principal.clone(), "death", "h", 3, 6).unwrap();
        assert_ne!(reopened, round_id);
        assert_eq!(f.agg.rounds_for(&principal).len(), 2);
    }

    #[test]
    fn test_cancel_rejects_finalized_round() {
        let mut f = fixture(1, ReputationPolicy::default());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 1, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();
        let err = f.agg.cancel_round(&f.admin, &round_id, 2).unwrap_err();
        assert!(matches!(err, FieError::RoundCompleted { .. }));
    }

    #[test]
    fn test_reputation_deltas_applied() {
        let policy = ReputationPolicy::default();
        let mut f = fixture(3, policy.clone());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 3, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[1], true, 98, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[2], false, 99, 1).unwrap();

        assert!(f.agg.round(&round_id).unwrap().valid);
        assert_eq!(f.agg.source(&f.sources[0]).unwrap().reputation, policy.initial + policy.reward);
        let dissenter = f.agg.source(&f.sources[2]).unwrap();
        assert_eq!(dissenter.reputation, policy.initial - policy.penalty);
        assert_eq!(dissenter.disagreements, 1);
    }

    #[test]
    fn test_sources_below_participation_floor_excluded_but_recoverable() {
        let policy = ReputationPolicy {
            initial: 51,
            participation_floor: 50,
            penalty: 5,
            ..Default::default()
        };
        let mut f = fixture(3, policy.clone());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 3, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[1], true, 99, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[2], false, 99, 1).unwrap();

        let eligible = f.agg.eligible_sources();
        assert_eq!(eligible.len(), 2);
        assert!(!eligible.contains(&f.sources[2]));
        assert!(f.agg.source(&f.sources[2]).is_some());

        f.agg.reset_reputation(&f.admin, &f.sources[2]).unwrap();
        assert_eq!(f.agg.eligible_sources().len(), 3);
    }

    #[test]
    fn test_reverse_penalty_within_window_once() {
        let policy = ReputationPolicy::default();
        let mut f = fixture(3, policy.clone());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 3, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[1], true, 99, 1).unwrap();
        f.agg.submit(&round_id, &f.sources[2], false, 99, 10).unwrap();

        let err = f.agg.reverse_penalty(&f.admin, &round_id, &f.sources[0], 11).unwrap_err();
        assert!(matches!(err, FieError::NothingToReverse { .. }));

        f.agg.reverse_penalty(&f.admin, &round_id, &f.sources[2], 11).unwrap();
        let s = f.agg.source(&f.sources[2]).unwrap();
        assert_eq!(s.reputation, policy.initial);
        assert_eq!(s.disagreements, 0);
        assert_eq!(s.agreements, 1);

        let err = f.agg.reverse_penalty(&f.admin, &round_id, &f.sources[2], 12).unwrap_err();
        assert!(matches!(err, FieError::NothingToReverse { .. }));
    }

    #[test]
    fn test_reverse_penalty_after_window_rejected() {
        let policy = ReputationPolicy::default();
        let mut f = fixture(2, policy.clone());
        let round_id = f.agg.open(PrincipalId::new(), "death", "h", 2, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[0], true, 99, 0).unwrap();
        f.agg.submit(&round_id, &f.sources[1], false, 99, 0).unwrap();

        // 1 of 2 positive is no majority, so the true-voter was penalized
        assert!(!f.agg.round(&round_id).unwrap().valid);
        let late = policy.dispute_window_secs + 1;
        let err = f.agg.reverse_penalty(&f.admin, &round_id, &f.sources[0], late).unwrap_err();
        assert!(matches!(err, FieError::DisputeWindowClosed { .. }));
    }

    #[test]
    fn test_admin_only_operations() {
        let mut f = fixture(1, ReputationPolicy::default());
        let intruder = ActorId::new();
        assert!(matches!(
            f.agg.register_source(&intruder, SourceId::new(), 0),
            Err(FieError::Unauthorized { .. })
        ));
        assert!(f.agg.deactivate_source(&intruder, &f.sources[0]).is_err());
        assert!(f.agg.reset_reputation(&intruder, &f.sources[0]).is_err());
    }

    #[test]
    fn test_deactivation_is_a_flag() {
        let mut f = fixture(2, ReputationPolicy::default());
        f.agg.deactivate_source(&f.admin, &f.sources[0]).unwrap();
        assert!(matches!(
            f.agg.deactivate_source(&f.admin, &f.sources[0]),
            Err(FieError::SourceActiveState { .. })
        ));
        assert_eq!(f.agg.sources().count(), 2);
        assert_eq!(f.agg.eligible_sources(), vec![f.sources[1].clone()]);
        f.agg.reactivate_source(&f.admin, &f.sources[0]).unwrap();
        assert_eq!(f.agg.eligible_sources().len(), 2);
    }
}
