//! Attestation sources and the reputation policy applied to them

use fie_types::{FieError, Result, SourceId, Timestamp};
use serde::{Deserialize, Serialize};

/// Highest reputation a source can hold
pub const MAX_REPUTATION: u8 = 100;

/// Reward/penalty policy for round responders.
///
/// The reward:penalty ratio is policy, not a constant. Penalties are floored
/// so a colluding majority can push an honest dissenter out of dispatch but
/// never erase it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationPolicy {
    /// Reputation assigned on registration and on administrative reset
    pub initial: u8,
    /// Lowest reputation any sequence of penalties can reach
    pub floor: u8,
    /// Minimum reputation to be dispatched to
    pub participation_floor: u8,
    /// Added for agreeing with the round outcome
    pub reward: u8,
    /// Subtracted for disagreeing with the round outcome
    pub penalty: u8,
    /// Seconds after finalization during which a penalty may be reversed
    pub dispute_window_secs: i64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            initial: 75,
            floor: 10,
            participation_floor: 50,
            reward: 1,
            penalty: 2,
            dispute_window_secs: 7 * fie_types::DAY_SECS,
        }
    }
}

impl ReputationPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.floor > self.participation_floor || self.participation_floor > MAX_REPUTATION {
            return Err(FieError::InvalidPolicy {
                reason: format!(
                    "need floor ({}) <= participation_floor ({}) <= {}",
                    self.floor, self.participation_floor, MAX_REPUTATION
                ),
            });
        }
        if self.initial < self.floor || self.initial > MAX_REPUTATION {
            return Err(FieError::InvalidPolicy {
                reason: format!("initial reputation {} outside [{}, {}]", self.initial, self.floor, MAX_REPUTATION),
            });
        }
        if self.penalty == 0 {
            return Err(FieError::InvalidPolicy {
                reason: "penalty must be positive".to_string(),
            });
        }
        if self.dispute_window_secs < 0 {
            return Err(FieError::InvalidPolicy {
                reason: "dispute window cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// A registered attestation source. Never deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationSource {
    pub id: SourceId,
    pub active: bool,
    pub reputation: u8,
    pub agreements: u64,
    pub disagreements: u64,
    pub registered_at: Timestamp,
}

impl AttestationSource {
    pub fn new(id: SourceId, policy: &ReputationPolicy, registered_at: Timestamp) -> Self {
        Self {
            id,
            active: true,
            reputation: policy.initial,
            agreements: 0,
            disagreements: 0,
            registered_at,
        }
    }

    /// Active and at or above the participation floor
    pub fn is_eligible(&self, policy: &ReputationPolicy) -> bool {
        self.active && self.reputation >= policy.participation_floor
    }

    /// Apply an agreement and return the signed change actually applied
    pub fn record_agreement(&mut self, policy: &ReputationPolicy) -> i16 {
        let before = self.reputation;
        self.reputation = before.saturating_add(policy.reward).min(MAX_REPUTATION);
        self.agreements += 1;
        self.reputation as i16 - before as i16
    }

    /// Apply a disagreement and return the signed change actually applied
    pub fn record_disagreement(&mut self, policy: &ReputationPolicy) -> i16 {
        let before = self.reputation;
        self.reputation = before.saturating_sub(policy.penalty).max(policy.floor);
        self.disagreements += 1;
        self.reputation as i16 - before as i16
    }
}
