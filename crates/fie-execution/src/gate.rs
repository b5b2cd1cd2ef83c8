//! The execution gate
//!
//! Order of evaluation for [`ExecutionGate::decide`]:
//!
//! 1. activation and sunset preconditions, then request shape
//! 2. content policy (a block here beats any confidence and needs no corpus)
//! 3. the frozen corpus hash against the caller's evidence hash
//! 4. citation lookup, re-validated locally
//! 5. confidence threshold; below it the gate defaults to inaction
//! 6. bookkeeping, record, then the external effect (rolled back on failure)

use std::collections::HashMap;
use std::sync::Arc;

use fie_guard::{ContentPolicyGate, PolicyVerdict};
use fie_types::{ActionId, ActorId, FieError, PrincipalId, Result, Timestamp, CONFIDENCE_THRESHOLD, MAX_CONFIDENCE};
use tracing::{error, info, warn};

use crate::citation::{is_corpus_hash, CitationResolution, CitationService};
use crate::ledger::AssetLedger;
use crate::record::{ActionEffect, ActionRecord, ActionRequest, Outcome};
use crate::treasury::Treasury;

/// What the gate needs to know about the rest of the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionAuthority {
    pub activated_at: Option<Timestamp>,
    /// Sunset has been initiated
    pub halted: bool,
}

pub struct ExecutionGate {
    policy: ContentPolicyGate,
    citations: Arc<dyn CitationService>,
    ledger: Arc<dyn AssetLedger>,
    treasury: Treasury,
    corpus: HashMap<PrincipalId, String>,
    records: Vec<ActionRecord>,
    index: HashMap<ActionId, usize>,
}

impl ExecutionGate {
    pub fn new(citations: Arc<dyn CitationService>, ledger: Arc<dyn AssetLedger>) -> Self {
        Self {
            policy: ContentPolicyGate::new(),
            citations,
            ledger,
            treasury: Treasury::new(),
            corpus: HashMap::new(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Freeze the hash of the principal's evidence corpus. Once only.
    pub fn register_corpus(&mut self, caller: &ActorId, principal: &PrincipalId, corpus_hash: &str) -> Result<()> {
        if caller != principal {
            return Err(FieError::unauthorized(caller, "register another principal's corpus"));
        }
        if !is_corpus_hash(corpus_hash) {
            return Err(FieError::invalid_input("corpus_hash", "expected 64 lowercase hex characters"));
        }
        if self.corpus.contains_key(principal) {
            return Err(FieError::CorpusAlreadyRegistered {
                principal: principal.to_string(),
            });
        }
        self.corpus.insert(principal.clone(), corpus_hash.to_string());
        info!(principal = %principal, corpus_hash, "corpus registered");
        Ok(())
    }

    pub fn deposit(&mut self, principal: &PrincipalId, amount: u64) -> Result<u64> {
        let balance = self.treasury.credit(principal, amount)?;
        info!(principal = %principal, amount, balance, "treasury deposit");
        Ok(balance)
    }

    /// Decide one action. Blocked and low-confidence results are outcomes, not errors.
    pub fn decide(&mut self, authority: ExecutionAuthority, request: ActionRequest, now: Timestamp) -> Result<ActionRecord> {
        let principal = request.principal.clone();
        if authority.activated_at.is_none() {
            return Err(FieError::NotActivated {
                principal: principal.to_string(),
            });
        }
        if authority.halted {
            warn!(principal = %principal, "decision attempted after sunset initiation");
            return Err(FieError::ExecutionHalted {
                principal: principal.to_string(),
            });
        }
        request.validate()?;

        if let PolicyVerdict::Blocked {
            category, matched_term, ..
        } = self.policy.evaluate(&request.descriptor)
        {
            let outcome = Outcome::Blocked { matched_term, category };
            return Ok(self.append(request, None, None, outcome, now));
        }

        let expected_corpus = self
            .corpus
            .get(&principal)
            .ok_or_else(|| FieError::CorpusNotRegistered {
                principal: principal.to_string(),
            })?
            .clone();
        if request.evidence_hash != expected_corpus {
            return Err(FieError::EvidenceMismatch {
                expected: expected_corpus,
                actual: request.evidence_hash,
            });
        }

        let resolution = self.citations.resolve(&principal, &request.query)?;
        verify_resolution(&resolution, &expected_corpus)?;
        let CitationResolution {
            citation, confidence, ..
        } = resolution;

        if confidence < CONFIDENCE_THRESHOLD {
            info!(principal = %principal, confidence, threshold = CONFIDENCE_THRESHOLD, "confidence below threshold, defaulting to inaction");
            let outcome = Outcome::DefaultedToInaction { confidence };
            return Ok(self.append(request, Some(citation), Some(confidence), outcome, now));
        }

        self.execute(request, citation, confidence, now)
    }

    fn execute(&mut self, request: ActionRequest, citation: String, confidence: u8, now: Timestamp) -> Result<ActionRecord> {
        let principal = request.principal.clone();
        let effect = request.effect.clone();

        // bookkeeping before the external call
        if let Some(amount) = effect.amount() {
            self.treasury.debit(&principal, amount)?;
        }
        let outcome = Outcome::Executed {
            citation: citation.clone(),
            confidence,
        };
        let record = self.append(request, Some(citation), Some(confidence), outcome, now);

        let external = match &effect {
            ActionEffect::RecordOnly => Ok(()),
            ActionEffect::Transfer { recipient, amount } => self.ledger.transfer(&principal, recipient, *amount),
            ActionEffect::FundProject { project, amount } => self.ledger.transfer(&principal, project, *amount),
            ActionEffect::IssueLicense {
                licensee,
                asset,
                royalty_bps,
                duration_secs,
            } => self
                .ledger
                .issue_license(&principal, licensee, asset, *royalty_bps, *duration_secs),
        };

        if let Err(e) = external {
            error!(principal = %principal, action = %record.id, error = %e, "external effect failed, rolling back");
            self.rollback(&record);
            return Err(e);
        }
        Ok(record)
    }

    fn append(
        &mut self,
        request: ActionRequest,
        citation: Option<String>,
        confidence: Option<u8>,
        outcome: Outcome,
        now: Timestamp,
    ) -> ActionRecord {
        let record = ActionRecord {
            id: ActionId::new(),
            principal: request.principal,
            descriptor: request.descriptor,
            effect: request.effect,
            citation,
            confidence,
            timestamp: now,
            outcome,
        };
        info!(principal = %record.principal, action = %record.id, outcome = %record.outcome, "action decided");
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record.clone());
        record
    }

    fn rollback(&mut self, record: &ActionRecord) {
        if let Some(amount) = record.effect.amount() {
            if let Err(e) = self.treasury.credit(&record.principal, amount) {
                error!(principal = %record.principal, action = %record.id, amount, error = %e, "failed to restore treasury during rollback");
            }
        }
        if self.records.last().map(|r| &r.id) == Some(&record.id) {
            self.records.pop();
        }
        self.index.remove(&record.id);
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    pub fn records(&self, principal: &PrincipalId) -> Vec<&ActionRecord> {
        self.records.iter().filter(|r| &r.principal == principal).collect()
    }

    pub fn all_records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn record(&self, id: &ActionId) -> Result<&ActionRecord> {
        self.index
            .get(id)
            .and_then(|i| self.records.get(*i))
            .ok_or_else(|| FieError::ActionNotFound {
                action_id: id.to_string(),
            })
    }

    pub fn balance(&self, principal: &PrincipalId) -> u64 {
        self.treasury.balance(principal)
    }

    pub fn corpus_hash(&self, principal: &PrincipalId) -> Option<&str> {
        self.corpus.get(principal).map(String::as_str)
    }

    pub fn citations(&self) -> &Arc<dyn CitationService> {
        &self.citations
    }

    pub fn ledger(&self) -> &Arc<dyn AssetLedger> {
        &self.ledger
    }
}

fn verify_resolution(resolution: &CitationResolution, expected_corpus: &str) -> Result<()> {
    if resolution.confidence > MAX_CONFIDENCE {
        return Err(FieError::CitationIntegrity {
            reason: format!("confidence {} outside [0, {}]", resolution.confidence, MAX_CONFIDENCE),
        });
    }
    if resolution.citation.trim().is_empty() {
        return Err(FieError::CitationIntegrity {
            reason: "empty citation".to_string(),
        });
    }
    if resolution.corpus_hash != expected_corpus {
        warn!(expected = expected_corpus, actual = %resolution.corpus_hash, "citation drawn from unexpected corpus");
        return Err(FieError::CorpusHashMismatch {
            expected: expected_corpus.to_string(),
            actual: resolution.corpus_hash.clone(),
        });
    }
    Ok(())
}
