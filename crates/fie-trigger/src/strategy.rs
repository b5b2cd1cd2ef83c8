//! Triggering strategies

use std::collections::HashSet;
use std::fmt;

use fie_attestation::MAX_ROUND_SOURCES;
use fie_types::{ActorId, FieError, PrincipalId, Result, DAY_SECS};
use serde::{Deserialize, Serialize};

/// Default lower bound on the inactivity interval
pub const DEFAULT_MIN_INACTIVITY_SECS: i64 = 30 * DAY_SECS;

/// How a principal's intent becomes active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerStrategy {
    /// Fires once the principal stops checking in for `interval_secs`
    InactivityTimeout { interval_secs: i64 },
    /// Fires when `threshold` of the roster have signed
    Quorum { roster: Vec<ActorId>, threshold: usize },
    /// Fires on a valid aggregation round for `event_type`
    AttestedEvent {
        event_type: String,
        min_sources: usize,
        /// Also accept one unverified reporter (needs the `unverified-fallback` build)
        #[serde(default)]
        allow_unverified: bool,
    },
}

/// Which path produced an activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    InactivityTimeout,
    Quorum,
    AttestedEvent,
    UnverifiedReport,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::InactivityTimeout => "inactivity_timeout",
            StrategyKind::Quorum => "quorum",
            StrategyKind::AttestedEvent => "attested_event",
            StrategyKind::UnverifiedReport => "unverified_report",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TriggerStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            TriggerStrategy::InactivityTimeout { .. } => StrategyKind::InactivityTimeout,
            TriggerStrategy::Quorum { .. } => StrategyKind::Quorum,
            TriggerStrategy::AttestedEvent { .. } => StrategyKind::AttestedEvent,
        }
    }

    /// Check the strategy is well formed for `principal`
    pub fn validate(&self, principal: &PrincipalId, min_inactivity_secs: i64) -> Result<()> {
        match self {
            TriggerStrategy::InactivityTimeout { interval_secs } => {
                if *interval_secs < min_inactivity_secs {
                    return Err(FieError::invalid_input(
                        "interval_secs",
                        format!("{} is below the minimum of {}", interval_secs, min_inactivity_secs),
                    ));
                }
            }
            TriggerStrategy::Quorum { roster, threshold } => {
                if roster.is_empty() {
                    return Err(FieError::invalid_input("roster", "must not be empty"));
                }
                if roster.contains(principal) {
                    return Err(FieError::invalid_input("roster", "principal cannot sign for itself"));
                }
                let unique: HashSet<&ActorId> = roster.iter().collect();
                if unique.len() != roster.len() {
                    return Err(FieError::invalid_input("roster", "contains duplicate parties"));
                }
                if *threshold == 0 || *threshold > roster.len() {
                    return Err(FieError::invalid_input(
                        "threshold",
                        format!("must be in 1..={}", roster.len()),
                    ));
                }
            }
            TriggerStrategy::AttestedEvent {
                event_type,
                min_sources,
                ..
            } => {
                if event_type.trim().is_empty() {
                    return Err(FieError::invalid_input("event_type", "must not be empty"));
                }
                if *min_sources == 0 || *min_sources > MAX_ROUND_SOURCES {
                    return Err(FieError::invalid_input(
                        "min_sources",
                        format!("must be in 1..={}", MAX_ROUND_SOURCES),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactivity_minimum_interval() {
        let p = PrincipalId::new();
        let short = TriggerStrategy::InactivityTimeout {
            interval_secs: DEFAULT_MIN_INACTIVITY_SECS - 1,
        };
        assert!(short.validate(&p, DEFAULT_MIN_INACTIVITY_SECS).is_err());
        let ok = TriggerStrategy::InactivityTimeout {
            interval_secs: DEFAULT_MIN_INACTIVITY_SECS,
        };
        assert!(ok.validate(&p, DEFAULT_MIN_INACTIVITY_SECS).is_ok());
    }

    #[test]
    fn test_quorum_roster_rules() {
        let p = PrincipalId::new();
        let a = ActorId::new();
        let b = ActorId::new();

        let dup = TriggerStrategy::Quorum {
            roster: vec![a.clone(), a.clone()],
            threshold: 1,
        };
        assert!(dup.validate(&p, 0).is_err());

        let with_principal = TriggerStrategy::Quorum {
            roster: vec![a.clone(), p.clone()],
            threshold: 1,
        };
        assert!(with_principal.validate(&p, 0).is_err());

        let too_high = TriggerStrategy::Quorum {
            roster: vec![a.clone(), b.clone()],
            threshold: 3,
        };
        assert!(too_high.validate(&p, 0).is_err());

        let zero = TriggerStrategy::Quorum {
            roster: vec![a.clone(), b.clone()],
            threshold: 0,
        };
        assert!(zero.validate(&p, 0).is_err());

        let ok = TriggerStrategy::Quorum {
            roster: vec![a, b],
            threshold: 2,
        };
        assert!(ok.validate(&p, 0).is_ok());
    }

    #[test]
    fn test_attested_event_rules() {
        let p = PrincipalId::new();
        let bad = TriggerStrategy::AttestedEvent {
            event_type: " ".into(),
            min_sources: 3,
            allow_unverified: false,
        };
        assert!(bad.validate(&p, 0).is_err());
        let bad = TriggerStrategy::AttestedEvent {
            event_type: "death".into(),
            min_sources: 0,
            allow_unverified: false,
        };
        assert!(bad.validate(&p, 0).is_err());
    }

    #[test]
    fn test_strategy_serde_tag() {
        let s = TriggerStrategy::InactivityTimeout { interval_secs: 10 };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"kind\":\"inactivity_timeout\""));
        assert_eq!(s.kind().to_string(), "inactivity_timeout");
    }
}
