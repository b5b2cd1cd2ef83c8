//! Semantic citation service boundary
//!
//! The service turns a free-text query into a citation from the principal's
//! corpus plus an integer confidence. Nothing it returns is trusted: the gate
//! re-checks the confidence range and the corpus hash itself.

use std::collections::HashMap;

use fie_types::{FieError, PrincipalId, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationResolution {
    pub citation: String,
    /// Claimed to be on [0, 100]; verified by the caller
    pub confidence: u8,
    /// Hash of the corpus the citation was drawn from
    pub corpus_hash: String,
}

pub trait CitationService: Send + Sync {
    /// Resolve a free-text query against the principal's corpus
    fn resolve(&self, principal: &PrincipalId, query: &str) -> Result<CitationResolution>;

    /// Group archived assets into a discoverable cluster, returning its id
    fn cluster(&self, principal: &PrincipalId, assets: &[String]) -> Result<String>;
}

/// Hash a corpus of documents as lowercase hex SHA-256
pub fn hash_corpus<S: AsRef<str>>(documents: &[S]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        let bytes = doc.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    hex::encode(hasher.finalize())
}

/// Whether `hash` looks like a lowercase hex SHA-256 digest
pub fn is_corpus_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Citation service with canned answers
#[derive(Debug, Default)]
pub struct StaticCitationService {
    corpus_hash: Mutex<String>,
    answers: Mutex<HashMap<String, (String, u8)>>,
    clusters: Mutex<Vec<(PrincipalId, Vec<String>)>>,
    unavailable: Mutex<bool>,
}

impl StaticCitationService {
    pub fn new(corpus_hash: impl Into<String>) -> Self {
        Self {
            corpus_hash: Mutex::new(corpus_hash.into()),
            ..Default::default()
        }
    }

    pub fn answer(&self, query: impl Into<String>, citation: impl Into<String>, confidence: u8) {
        self.answers.lock().insert(query.into(), (citation.into(), confidence));
    }

    /// Report a different corpus from now on
    pub fn set_corpus_hash(&self, corpus_hash: impl Into<String>) {
        *self.corpus_hash.lock() = corpus_hash.into();
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    pub fn clusters(&self) -> Vec<(PrincipalId, Vec<String>)> {
        self.clusters.lock().clone()
    }
}

impl CitationService for StaticCitationService {
    fn resolve(&self, _principal: &PrincipalId, query: &str) -> Result<CitationResolution> {
        if *self.unavailable.lock() {
            return Err(FieError::CitationService {
                message: "service unavailable".to_string(),
            });
        }
        let answers = self.answers.lock();
        let (citation, confidence) = answers.get(query).ok_or_else(|| FieError::CitationService {
            message: format!("no citation for query '{}'", query),
        })?;
        Ok(CitationResolution {
            citation: citation.clone(),
            confidence: *confidence,
            corpus_hash: self.corpus_hash.lock().clone(),
        })
    }

    fn cluster(&self, principal: &PrincipalId, assets: &[String]) -> Result<String> {
        if *self.unavailable.lock() {
            return Err(FieError::CitationService {
                message: "service unavailable".to_string(),
            });
        }
        let mut clusters = self.clusters.lock();
        clusters.push((principal.clone(), assets.to_vec()));
        Ok(format!("cluster_{}", clusters.len()))
    }
}
