//! Action requests and the append-only decision log

use std::fmt;

use fie_guard::PolicyCategory;
use fie_types::{ActionId, FieError, PrincipalId, Result, Timestamp};
use serde::{Deserialize, Serialize};

/// Longest accepted action descriptor, in bytes
pub const MAX_DESCRIPTOR_LEN: usize = 512;

/// Royalty ceiling in basis points (100%)
pub const MAX_ROYALTY_BPS: u16 = 10_000;

/// Side effect an executed action has
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ActionEffect {
    /// Decision is logged, nothing external happens
    RecordOnly,
    Transfer { recipient: String, amount: u64 },
    FundProject { project: String, amount: u64 },
    IssueLicense {
        licensee: String,
        asset: String,
        royalty_bps: u16,
        duration_secs: i64,
    },
}

impl ActionEffect {
    /// Amount drawn from the treasury, if any
    pub fn amount(&self) -> Option<u64> {
        match self {
            ActionEffect::Transfer { amount, .. } | ActionEffect::FundProject { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ActionEffect::RecordOnly => {}
            ActionEffect::Transfer { recipient: target, amount } | ActionEffect::FundProject { project: target, amount } => {
                if target.trim().is_empty() {
                    return Err(FieError::invalid_input("recipient", "must not be empty"));
                }
                if *amount == 0 {
                    return Err(FieError::invalid_input("amount", "must be positive"));
                }
            }
            ActionEffect::IssueLicense {
                licensee,
                asset,
                royalty_bps,
                duration_secs,
            } => {
                if licensee.trim().is_empty() || asset.trim().is_empty() {
                    return Err(FieError::invalid_input("license", "licensee and asset are required"));
                }
                if *royalty_bps > MAX_ROYALTY_BPS {
                    return Err(FieError::invalid_input(
                        "royalty_bps",
                        format!("{} exceeds {}", royalty_bps, MAX_ROYALTY_BPS),
                    ));
                }
                if *duration_secs <= 0 {
                    return Err(FieError::invalid_input("duration_secs", "must be positive"));
                }
            }
        }
        Ok(())
    }
}

/// A request to perform one action on a principal's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub principal: PrincipalId,
    /// Human-readable description, screened by the content policy
    pub descriptor: String,
    /// Free-text query sent to the citation service
    pub query: String,
    /// Hash of the evidence corpus the caller believes is in force
    pub evidence_hash: String,
    pub effect: ActionEffect,
}

impl ActionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.descriptor.trim().is_empty() {
            return Err(FieError::invalid_input("descriptor", "must not be empty"));
        }
        if self.descriptor.len() > MAX_DESCRIPTOR_LEN {
            return Err(FieError::invalid_input(
                "descriptor",
                format!("longer than {} bytes", MAX_DESCRIPTOR_LEN),
            ));
        }
        if self.query.trim().is_empty() {
            return Err(FieError::invalid_input("query", "must not be empty"));
        }
        self.effect.validate()
    }
}

/// Exactly one of these is produced per decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Executed { citation: String, confidence: u8 },
    DefaultedToInaction { confidence: u8 },
    Blocked { matched_term: String, category: PolicyCategory },
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Executed { .. } => "executed",
            Outcome::DefaultedToInaction { .. } => "defaulted_to_inaction",
            Outcome::Blocked { .. } => "blocked",
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable log entry for one decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    pub principal: PrincipalId,
    pub descriptor: String,
    pub effect: ActionEffect,
    /// None when blocked before the citation service was asked
    pub citation: Option<String>,
    pub confidence: Option<u8>,
    pub timestamp: Timestamp,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(descriptor: &str) -> ActionRequest {
        ActionRequest {
            principal: PrincipalId::new(),
            descriptor: descriptor.to_string(),
            query: "q".to_string(),
            evidence_hash: "h".to_string(),
            effect: ActionEffect::RecordOnly,
        }
    }

    #[test]
    fn test_descriptor_bounds() {
        assert!(request("fund the library").validate().is_ok());
        assert!(request("   ").validate().is_err());
        assert!(request(&"x".repeat(MAX_DESCRIPTOR_LEN)).validate().is_ok());
        assert!(request(&"x".repeat(MAX_DESCRIPTOR_LEN + 1)).validate().is_err());
    }

    #[test]
    fn test_effect_validation() {
        assert!(ActionEffect::Transfer {
            recipient: "heir".into(),
            amount: 0
        }
        .validate()
        .is_err());
        assert!(ActionEffect::IssueLicense {
            licensee: "press".into(),
            asset: "book".into(),
            royalty_bps: 10_001,
            duration_secs: 1
        }
        .validate()
        .is_err());
        assert!(ActionEffect::IssueLicense {
            licensee: "press".into(),
            asset: "book".into(),
            royalty_bps: 10_000,
            duration_secs: 0
        }
        .validate()
        .is_err());
        assert_eq!(
            ActionEffect::FundProject {
                project: "school".into(),
                amount: 5
            }
            .amount(),
            Some(5)
        );
    }

    #[test]
    fn test_outcome_serde_tag() {
        let o = Outcome::DefaultedToInaction { confidence: 94 };
        let json = serde_json::to_string(&o).unwrap();
        assert!(json.contains("\"outcome\":\"defaulted_to_inaction\""));
    }
}
