//! Activation state machine
//!
//! `Unconfigured -> Configured(strategy) -> Activated`. Unconfigured
//! principals have no record. Activated is terminal: every later attempt to
//! fire rejects with [`FieError::AlreadyActivated`].

use std::collections::HashMap;

use fie_attestation::AggregationRound;
use fie_types::{ActorId, FieError, PrincipalId, Result, RoundId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::strategy::{StrategyKind, TriggerStrategy, DEFAULT_MIN_INACTIVITY_SECS};

/// Tunables for the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerPolicy {
    /// Shortest inactivity interval a principal may configure
    pub min_inactivity_secs: i64,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            min_inactivity_secs: DEFAULT_MIN_INACTIVITY_SECS,
        }
    }
}

impl TriggerPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.min_inactivity_secs <= 0 {
            return Err(FieError::InvalidPolicy {
                reason: "min_inactivity_secs must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Coarse lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    Unconfigured,
    Configured,
    Activated,
}

/// The one activation a principal ever gets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub principal: PrincipalId,
    pub strategy: StrategyKind,
    pub activated_at: Timestamp,
    /// The round that fired an attested-event trigger
    pub round_id: Option<RoundId>,
    /// Whoever made the call that crossed the threshold
    pub fired_by: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub principal: PrincipalId,
    pub strategy: TriggerStrategy,
    pub configured_at: Timestamp,
    pub last_check_in: Timestamp,
    pub signatures: Vec<ActorId>,
    pub activation: Option<Activation>,
}

impl ActivationRecord {
    pub fn state(&self) -> ActivationState {
        if self.activation.is_some() {
            ActivationState::Activated
        } else {
            ActivationState::Configured
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activation.is_some()
    }
}

pub struct TriggerCoordinator {
    policy: TriggerPolicy,
    records: HashMap<PrincipalId, ActivationRecord>,
}

impl TriggerCoordinator {
    pub fn new(policy: TriggerPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            records: HashMap::new(),
        })
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    /// Set or replace the strategy. Only the principal may do this, and only before activation.
    pub fn configure(
        &mut self,
        caller: &ActorId,
        principal: &PrincipalId,
        strategy: TriggerStrategy,
        now: Timestamp,
    ) -> Result<()> {
        if caller != principal {
            return Err(FieError::unauthorized(caller, "configure another principal's trigger"));
        }
        if let Some(record) = self.records.get(principal) {
            if record.is_activated() {
                return Err(already_activated(principal));
            }
        }
        strategy.validate(principal, self.policy.min_inactivity_secs)?;

        info!(principal = %principal, strategy = %strategy.kind(), "trigger configured");
        self.records.insert(
            principal.clone(),
            ActivationRecord {
                principal: principal.clone(),
                strategy,
                configured_at: now,
                last_check_in: now,
                signatures: Vec::new(),
                activation: None,
            },
        );
        Ok(())
    }

    /// Principal proves liveness, pushing the inactivity deadline back
    pub fn check_in(&mut self, caller: &ActorId, principal: &PrincipalId, now: Timestamp) -> Result<()> {
        if caller != principal {
            return Err(FieError::unauthorized(caller, "check in for another principal"));
        }
        let record = self.pending_mut(principal)?;
        require_kind(record, StrategyKind::InactivityTimeout)?;
        record.last_check_in = now;
        debug!(principal = %principal, at = now, "check-in recorded");
        Ok(())
    }

    /// Deadline of an inactivity trigger, if one is configured
    pub fn inactivity_deadline(&self, principal: &PrincipalId) -> Option<Timestamp> {
        let record = self.records.get(principal)?;
        match record.strategy {
            TriggerStrategy::InactivityTimeout { interval_secs } => {
                Some(record.last_check_in.saturating_add(interval_secs))
            }
            _ => None,
        }
    }

    /// Permissionless once `last_check_in + interval <= now`
    pub fn fire_inactivity(&mut self, caller: &ActorId, principal: &PrincipalId, now: Timestamp) -> Result<Activation> {
        let record = self.pending_mut(principal)?;
        let interval = match record.strategy {
            TriggerStrategy::InactivityTimeout { interval_secs } => interval_secs,
            _ => return Err(mismatch(record, StrategyKind::InactivityTimeout)),
        };
        let deadline = record.last_check_in.saturating_add(interval);
        if now < deadline {
            return Err(FieError::InactivityNotElapsed { deadline, now });
        }
        Ok(activate(record, StrategyKind::InactivityTimeout, now, None, Some(caller.clone())))
    }

    /// A roster party signs. Returns the activation if this signature crossed the threshold.
    pub fn submit_signature(
        &mut self,
        caller: &ActorId,
        principal: &PrincipalId,
        now: Timestamp,
    ) -> Result<Option<Activation>> {
        let record = self.pending_mut(principal)?;
        let (roster, threshold) = match &record.strategy {
            TriggerStrategy::Quorum { roster, threshold } => (roster, *threshold),
            _ => return Err(mismatch(record, StrategyKind::Quorum)),
        };
        if !roster.contains(caller) {
            return Err(FieError::unauthorized(caller, "sign for a roster it is not on"));
        }
        if record.signatures.contains(caller) {
            return Err(FieError::DuplicateSignature {
                principal: principal.to_string(),
                party: caller.to_string(),
            });
        }
        record.signatures.push(caller.clone());
        info!(principal = %principal, party = %caller, signatures = record.signatures.len(), threshold, "quorum signature recorded");

        if record.signatures.len() >= threshold {
            return Ok(Some(activate(record, StrategyKind::Quorum, now, None, Some(caller.clone()))));
        }
        Ok(None)
    }

    /// Consider a finalized round. Returns the activation if this round fired it.
    pub fn on_round_finalized(&mut self, round: &AggregationRound, now: Timestamp) -> Result<Option<Activation>> {
        if !round.completed {
            return Err(FieError::RoundNotCompleted {
                round_id: round.id.to_string(),
            });
        }
        let Some(record) = self.records.get_mut(&round.principal) else {
            return Ok(None);
        };
        let qualifies = match &record.strategy {
            TriggerStrategy::AttestedEvent {
                event_type,
                min_sources,
                ..
            } => round.valid && &round.event_type == event_type && round.required >= *min_sources,
            _ => false,
        };
        if !qualifies {
            debug!(round = %round.id, principal = %round.principal, valid = round.valid, "round does not qualify for activation");
            return Ok(None);
        }
        if record.is_activated() {
            warn!(round = %round.id, principal = %round.principal, "qualifying round after activation ignored");
            return Ok(None);
        }
        Ok(Some(activate(
            record,
            StrategyKind::AttestedEvent,
            now,
            Some(round.id.clone()),
            None,
        )))
    }

    /// Lower-assurance single-reporter path for attested-event triggers.
    ///
    /// Always rejects unless built with the `unverified-fallback` feature and
    /// the principal opted in through `allow_unverified`.
    pub fn report_unverified(
        &mut self,
        reporter: &ActorId,
        principal: &PrincipalId,
        event_type: &str,
        now: Timestamp,
    ) -> Result<Activation> {
        if !unverified_fallback_compiled() {
            return Err(FieError::FallbackDisabled);
        }
        if reporter == principal {
            return Err(FieError::unauthorized(reporter, "report its own event"));
        }
        let record = self.pending_mut(principal)?;
        match &record.strategy {
            TriggerStrategy::AttestedEvent {
                event_type: configured,
                allow_unverified,
                ..
            } => {
                if !allow_unverified {
                    return Err(FieError::FallbackDisabled);
                }
                if configured != event_type {
                    return Err(FieError::invalid_input(
                        "event_type",
                        format!("expected {}, got {}", configured, event_type),
                    ));
                }
            }
            _ => return Err(mismatch(record, StrategyKind::AttestedEvent)),
        }
        warn!(principal = %principal, reporter = %reporter, event_type, "activating on an unverified report");
        Ok(activate(record, StrategyKind::UnverifiedReport, now, None, Some(reporter.clone())))
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    pub fn record(&self, principal: &PrincipalId) -> Option<&ActivationRecord> {
        self.records.get(principal)
    }

    pub fn state(&self, principal: &PrincipalId) -> ActivationState {
        self.records
            .get(principal)
            .map(|r| r.state())
            .unwrap_or(ActivationState::Unconfigured)
    }

    pub fn is_activated(&self, principal: &PrincipalId) -> bool {
        self.records.get(principal).is_some_and(|r| r.is_activated())
    }

    pub fn activation(&self, principal: &PrincipalId) -> Option<&Activation> {
        self.records.get(principal)?.activation.as_ref()
    }

    pub fn activated_at(&self, principal: &PrincipalId) -> Option<Timestamp> {
        self.activation(principal).map(|a| a.activated_at)
    }

    pub fn signatures(&self, principal: &PrincipalId) -> &[ActorId] {
        self.records
            .get(principal)
            .map(|r| r.signatures.as_slice())
            .unwrap_or(&[])
    }

    /// Record that is configured and not yet activated
    fn pending_mut(&mut self, principal: &PrincipalId) -> Result<&mut ActivationRecord> {
        let record = self
            .records
            .get_mut(principal)
            .ok_or_else(|| FieError::TriggerNotConfigured {
                principal: principal.to_string(),
            })?;
        if record.is_activated() {
            warn!(principal = %principal, "activation re-fire rejected");
            return Err(already_activated(principal));
        }
        Ok(record)
    }
}

impl Default for TriggerCoordinator {
    fn default() -> Self {
        Self {
            policy: TriggerPolicy::default(),
            records: HashMap::new(),
        }
    }
}

fn activate(
    record: &mut ActivationRecord,
    strategy: StrategyKind,
    now: Timestamp,
    round_id: Option<RoundId>,
    fired_by: Option<ActorId>,
) -> Activation {
    let activation = Activation {
        principal: record.principal.clone(),
        strategy,
        activated_at: now,
        round_id,
        fired_by,
    };
    record.activation = Some(activation.clone());
    info!(principal = %record.principal, strategy = %strategy, at = now, "principal activated");
    activation
}

fn require_kind(record: &ActivationRecord, required: StrategyKind) -> Result<()> {
    if record.strategy.kind() != required {
        return Err(mismatch(record, required));
    }
    Ok(())
}

fn mismatch(record: &ActivationRecord, required: StrategyKind) -> FieError {
    FieError::StrategyMismatch {
        configured: record.strategy.kind().to_string(),
        required: required.to_string(),
    }
}

fn already_activated(principal: &PrincipalId) -> FieError {
    FieError::AlreadyActivated {
        principal: principal.to_string(),
    }
}

#[cfg(any(test, feature = "unverified-fallback"))]
fn unverified_fallback_compiled() -> bool {
    true
}

#[cfg(not(any(test, feature = "unverified-fallback")))]
fn unverified_fallback_compiled() -> bool {
    false
}
