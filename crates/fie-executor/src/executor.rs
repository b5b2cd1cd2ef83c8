//! The `IntentExecutor` facade
//!
//! All component state sits behind one mutex. Each entry point reads the
//! clock, runs to completion under the lock, and appends one audit entry per
//! successful state change. Rejections append nothing.

use std::sync::Arc;

use fie_attestation::{
    AggregationRound, AttestationAggregator, AttestationDispatcher, AttestationSource, SubmitOutcome,
};
use fie_audit::{AuditEntry, AuditEvent, AuditTrail};
use fie_execution::{
    ActionRecord, ActionRequest, AssetLedger, CitationService, ExecutionAuthority, ExecutionGate,
};
use fie_sunset::{LicenseCategory, SunsetCoordinator, SunsetRecord};
use fie_trigger::{Activation, ActivationRecord, ActivationState, TriggerCoordinator, TriggerStrategy};
use fie_types::{ActionId, ActorId, Clock, PrincipalId, Result, RoundId, SourceId, Timestamp};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::FieConfig;

/// External collaborators the executor talks to
#[derive(Clone)]
pub struct Collaborators {
    pub dispatcher: Arc<dyn AttestationDispatcher>,
    pub citations: Arc<dyn CitationService>,
    pub ledger: Arc<dyn AssetLedger>,
}

/// Fixed administrative roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles {
    /// Manages attestation sources
    pub admin: ActorId,
    /// Drives the sunset workflow after initiation
    pub operator: ActorId,
}

struct State {
    aggregator: AttestationAggregator,
    trigger: TriggerCoordinator,
    gate: ExecutionGate,
    sunset: SunsetCoordinator,
    audit: AuditTrail,
}

impl State {
    fn authority(&self, principal: &PrincipalId) -> ExecutionAuthority {
        ExecutionAuthority {
            activated_at: self.trigger.activated_at(principal),
            halted: self.sunset.is_halted(principal),
        }
    }

    fn record_activation(&mut self, activation: &Activation, actor: Option<&ActorId>) {
        self.audit.append(
            activation.activated_at,
            actor,
            Some(&activation.principal),
            AuditEvent::Activated {
                strategy: activation.strategy.to_string(),
            },
        );
    }
}

pub struct IntentExecutor {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    roles: Roles,
}

impl IntentExecutor {
    pub fn new(config: &FieConfig, roles: Roles, collaborators: Collaborators, clock: Arc<dyn Clock>) -> Result<Self> {
        let aggregator =
            AttestationAggregator::new(config.reputation.clone(), roles.admin.clone(), collaborators.dispatcher)?;
        let trigger = TriggerCoordinator::new(config.trigger.clone())?;
        let gate = ExecutionGate::new(collaborators.citations, collaborators.ledger);
        let sunset = SunsetCoordinator::new(config.sunset.clone(), roles.operator.clone())?;

        Ok(Self {
            state: Mutex::new(State {
                aggregator,
                trigger,
                gate,
                sunset,
                audit: AuditTrail::new(),
            }),
            clock,
            roles,
        })
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn with_state<T>(&self, op: &'static str, f: impl FnOnce(&mut State, Timestamp) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let result = f(&mut *state, now);
        if let Err(e) = &result {
            debug!(op, error = %e, kind = ?e.kind(), "operation rejected");
        }
        result
    }

    // ------------------------------------------------------------------
    // Trigger
    // ------------------------------------------------------------------

    pub fn configure_trigger(&self, caller: &ActorId, principal: &PrincipalId, strategy: TriggerStrategy) -> Result<()> {
        self.with_state("configure_trigger", |s, now| {
            let kind = strategy.kind();
            s.trigger.configure(caller, principal, strategy, now)?;
            s.audit.append(
                now,
                Some(caller),
                Some(principal),
                AuditEvent::TriggerConfigured {
                    strategy: kind.to_string(),
                },
            );
            Ok(())
        })
    }

    pub fn check_in(&self, caller: &ActorId, principal: &PrincipalId) -> Result<()> {
        self.with_state("check_in", |s, now| {
            s.trigger.check_in(caller, principal, now)?;
            s.audit.append(now, Some(caller), Some(principal), AuditEvent::CheckedIn);
            Ok(())
        })
    }

    pub fn fire_inactivity(&self, caller: &ActorId, principal: &PrincipalId) -> Result<Activation> {
        self.with_state("fire_inactivity", |s, now| {
            let activation = s.trigger.fire_inactivity(caller, principal, now)?;
            s.record_activation(&activation, Some(caller));
            Ok(activation)
        })
    }

    pub fn submit_signature(&self, caller: &ActorId, principal: &PrincipalId) -> Result<Option<Activation>> {
        self.with_state("submit_signature", |s, now| {
            let activation = s.trigger.submit_signature(caller, principal, now)?;
            s.audit.append(
                now,
                Some(caller),
                Some(principal),
                AuditEvent::SignatureSubmitted { party: caller.clone() },
            );
            if let Some(activation) = &activation {
                s.record_activation(activation, Some(caller));
            }
            Ok(activation)
        })
    }

    pub fn report_unverified(&self, reporter: &ActorId, principal: &PrincipalId, event_type: &str) -> Result<Activation> {
        self.with_state("report_unverified", |s, now| {
            let activation = s.trigger.report_unverified(reporter, principal, event_type, now)?;
            s.record_activation(&activation, Some(reporter));
            Ok(activation)
        })
    }

    // ------------------------------------------------------------------
    // Attestation
    // ------------------------------------------------------------------

    pub fn register_source(&self, caller: &ActorId, source_id: SourceId) -> Result<()> {
        self.with_state("register_source", |s, now| {
            s.aggregator.register_source(caller, source_id.clone(), now)?;
            s.audit.append(now, Some(caller), None, AuditEvent::SourceRegistered { source_id });
            Ok(())
        })
    }

    pub fn deactivate_source(&self, caller: &ActorId, source_id: &SourceId) -> Result<()> {
        self.with_state("deactivate_source", |s, now| {
            s.aggregator.deactivate_source(caller, source_id)?;
            s.audit.append(
                now,
                Some(caller),
                None,
                AuditEvent::SourceDeactivated {
                    source_id: source_id.clone(),
                },
            );
            Ok(())
        })
    }

    pub fn reactivate_source(&self, caller: &ActorId, source_id: &SourceId) -> Result<()> {
        self.with_state("reactivate_source", |s, now| {
            s.aggregator.reactivate_source(caller, source_id)?;
            s.audit.append(
                now,
                Some(caller),
                None,
                AuditEvent::SourceReactivated {
                    source_id: source_id.clone(),
                },
            );
            Ok(())
        })
    }

    pub fn reset_reputation(&self, caller: &ActorId, source_id: &SourceId) -> Result<()> {
        self.with_state("reset_reputation", |s, now| {
            s.aggregator.reset_reputation(caller, source_id)?;
            s.audit.append(
                now,
                Some(caller),
                None,
                AuditEvent::ReputationReset {
                    source_id: source_id.clone(),
                },
            );
            Ok(())
        })
    }

    pub fn reverse_penalty(&self, caller: &ActorId, round_id: &RoundId, source_id: &SourceId) -> Result<()> {
        self.with_state("reverse_penalty", |s, now| {
            s.aggregator.reverse_penalty(caller, round_id, source_id, now)?;
            s.audit.append(
                now,
                Some(caller),
                None,
                AuditEvent::PenaltyReversed {
                    round_id: round_id.clone(),
                    source_id: source_id.clone(),
                },
            );
            Ok(())
        })
    }

    pub fn open_aggregation(
        &self,
        caller: &ActorId,
        principal: &PrincipalId,
        event_type: &str,
        evidence_hash: &str,
        required_sources: usize,
    ) -> Result<RoundId> {
        self.with_state("open_aggregation", |s, now| {
            let round_id = s
                .aggregator
                .open(principal.clone(), event_type, evidence_hash, required_sources, now)?;
            s.audit.append(
                now,
                Some(caller),
                Some(principal),
                AuditEvent::RoundOpened {
                    round_id: round_id.clone(),
                },
            );
            Ok(round_id)
        })
    }

    /// Admin-only abandonment of a round that can no longer fill
    pub fn cancel_round(&self, caller: &ActorId, round_id: &RoundId) -> Result<()> {
        self.with_state("cancel_round", |s, now| {
            s.aggregator.cancel_round(caller, round_id, now)?;
            let principal = s.aggregator.round(round_id).map(|r| r.principal.clone());
            s.audit.append(
                now,
                Some(caller),
                principal.as_ref(),
                AuditEvent::RoundCancelled {
                    round_id: round_id.clone(),
                },
            );
            Ok(())
        })
    }

    /// Record a source's verdict. The filling submission finalizes the round
    /// and may activate an attested-event trigger in the same call.
    pub fn submit_attestation(
        &self,
        source_id: &SourceId,
        round_id: &RoundId,
        verdict: bool,
        confidence: u8,
    ) -> Result<SubmitOutcome> {
        self.with_state("submit_attestation", |s, now| {
            let outcome = s.aggregator.submit(round_id, source_id, verdict, confidence, now)?;
            let round = s.aggregator.round(round_id).cloned();
            let principal = round.as_ref().map(|r| r.principal.clone());
            s.audit.append(
                now,
                None,
                principal.as_ref(),
                AuditEvent::AttestationSubmitted {
                    round_id: round_id.clone(),
                    source_id: source_id.clone(),
                },
            );

            if let (SubmitOutcome::Finalized { valid, .. }, Some(round)) = (&outcome, round) {
                s.audit.append(
                    now,
                    None,
                    Some(&round.principal),
                    AuditEvent::RoundFinalized {
                        round_id: round_id.clone(),
                        valid: *valid,
                    },
                );
                if let Some(activation) = s.trigger.on_round_finalized(&round, now)? {
                    s.record_activation(&activation, None);
                }
            }
            Ok(outcome)
        })
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    pub fn register_corpus(&self, caller: &ActorId, principal: &PrincipalId, corpus_hash: &str) -> Result<()> {
        self.with_state("register_corpus", |s, now| {
            s.gate.register_corpus(caller, principal, corpus_hash)?;
            s.audit.append(
                now,
                Some(caller),
                Some(principal),
                AuditEvent::CorpusRegistered {
                    corpus_hash: corpus_hash.to_string(),
                },
            );
            Ok(())
        })
    }

    /// Credit the principal's treasury; returns the new balance
    pub fn deposit(&self, caller: &ActorId, principal: &PrincipalId, amount: u64) -> Result<u64> {
        self.with_state("deposit", |s, now| {
            let balance = s.gate.deposit(principal, amount)?;
            s.audit.append(now, Some(caller), Some(principal), AuditEvent::Deposited { amount });
            Ok(balance)
        })
    }

    pub fn decide(&self, caller: &ActorId, request: ActionRequest) -> Result<ActionRecord> {
        self.with_state("decide", |s, now| {
            let authority = s.authority(&request.principal);
            let record = s.gate.decide(authority, request, now)?;
            s.audit.append(
                now,
                Some(caller),
                Some(&record.principal),
                AuditEvent::ActionDecided {
                    action_id: record.id.clone(),
                    outcome: record.outcome.to_string(),
                },
            );
            Ok(record)
        })
    }

    // ------------------------------------------------------------------
    // Sunset
    // ------------------------------------------------------------------

    pub fn initiate_sunset(&self, caller: &ActorId, principal: &PrincipalId) -> Result<SunsetRecord> {
        self.with_state("initiate_sunset", |s, now| {
            let activated_at = s.trigger.activated_at(principal);
            let record = s.sunset.initiate(caller, principal, activated_at, now)?.clone();
            s.audit.append(now, Some(caller), Some(principal), AuditEvent::SunsetInitiated);
            Ok(record)
        })
    }

    /// Archive one batch; returns the total archived so far
    pub fn archive(&self, caller: &ActorId, principal: &PrincipalId, assets: Vec<String>) -> Result<usize> {
        self.with_state("archive", |s, now| {
            let items = assets.len();
            let total = s.sunset.archive(caller, principal, assets, now)?;
            s.audit.append(now, Some(caller), Some(principal), AuditEvent::ArchiveBatch { items });
            Ok(total)
        })
    }

    pub fn finalize_archive(&self, caller: &ActorId, principal: &PrincipalId) -> Result<()> {
        self.with_state("finalize_archive", |s, now| {
            s.sunset.finalize_archive(caller, principal, now)?;
            s.audit.append(now, Some(caller), Some(principal), AuditEvent::ArchiveFinalized);
            Ok(())
        })
    }

    pub fn relicense(
        &self,
        caller: &ActorId,
        principal: &PrincipalId,
        license: Option<LicenseCategory>,
    ) -> Result<LicenseCategory> {
        self.with_state("relicense", |s, now| {
            let ledger = s.gate.ledger().clone();
            let license = s.sunset.relicense(caller, principal, license, ledger.as_ref(), now)?;
            s.audit.append(
                now,
                Some(caller),
                Some(principal),
                AuditEvent::Relicensed {
                    license: license.spdx().to_string(),
                },
            );
            Ok(license)
        })
    }

    pub fn cluster(&self, caller: &ActorId, principal: &PrincipalId) -> Result<String> {
        self.with_state("cluster", |s, now| {
            let citations = s.gate.citations().clone();
            let cluster_id = s.sunset.cluster(caller, principal, citations.as_ref(), now)?;
            s.audit.append(
                now,
                Some(caller),
                Some(principal),
                AuditEvent::Clustered {
                    cluster_id: cluster_id.clone(),
                },
            );
            Ok(cluster_id)
        })
    }

    pub fn complete_sunset(&self, caller: &ActorId, principal: &PrincipalId) -> Result<()> {
        self.with_state("complete_sunset", |s, now| {
            s.sunset.complete(caller, principal, now)?;
            s.audit.append(now, Some(caller), Some(principal), AuditEvent::SunsetCompleted);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    pub fn activation_record(&self, principal: &PrincipalId) -> Option<ActivationRecord> {
        self.state.lock().trigger.record(principal).cloned()
    }

    pub fn activation_state(&self, principal: &PrincipalId) -> ActivationState {
        self.state.lock().trigger.state(principal)
    }

    pub fn is_activated(&self, principal: &PrincipalId) -> bool {
        self.state.lock().trigger.is_activated(principal)
    }

    pub fn source(&self, source_id: &SourceId) -> Option<AttestationSource> {
        self.state.lock().aggregator.source(source_id).cloned()
    }

    pub fn sources(&self) -> Vec<AttestationSource> {
        self.state.lock().aggregator.sources().cloned().collect()
    }

    pub fn eligible_sources(&self) -> Vec<SourceId> {
        self.state.lock().aggregator.eligible_sources()
    }

    pub fn round(&self, round_id: &RoundId) -> Option<AggregationRound> {
        self.state.lock().aggregator.round(round_id).cloned()
    }

    pub fn action_records(&self, principal: &PrincipalId) -> Vec<ActionRecord> {
        self.state.lock().gate.records(principal).into_iter().cloned().collect()
    }

    pub fn action_record(&self, action_id: &ActionId) -> Result<ActionRecord> {
        self.state.lock().gate.record(action_id).cloned()
    }

    pub fn balance(&self, principal: &PrincipalId) -> u64 {
        self.state.lock().gate.balance(principal)
    }

    pub fn corpus_hash(&self, principal: &PrincipalId) -> Option<String> {
        self.state.lock().gate.corpus_hash(principal).map(str::to_string)
    }

    pub fn sunset_record(&self, principal: &PrincipalId) -> Option<SunsetRecord> {
        self.state.lock().sunset.record(principal).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.lock().audit.entries().to_vec()
    }

    pub fn audit_for(&self, principal: &PrincipalId) -> Vec<AuditEntry> {
        self.state
            .lock()
            .audit
            .for_principal(principal)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn verify_audit(&self) -> bool {
        self.state.lock().audit.verify_chain()
    }
}
