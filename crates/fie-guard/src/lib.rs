//! FIE Guard - Content Policy Gate
//!
//! Classifies a free-text action descriptor before any evidentiary score is
//! consulted. A blocked descriptor stays blocked no matter how confident the
//! citation service is.
//!
//! # Layers
//!
//! Evaluated in order; the first four short-circuit to [`PolicyVerdict::Blocked`]:
//!
//! 1. Exact prohibited-category match on the whole descriptor
//! 2. Primary keywords, case-insensitive, whole-token only
//! 3. Common misspellings of primary keywords
//! 4. Phrase patterns, in order, tolerating stopwords and short gaps
//! 5. Secondary keywords, advisory only (logged, never blocking)
//!
//! The table lives in [`table`] and is fixed at build time. There is no
//! runtime configuration surface.

pub mod table;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Prohibited action categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCategory {
    ElectoralActivity,
    PoliticalAdvocacy,
    Lobbying,
    PolicyInfluence,
}

impl PolicyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyCategory::ElectoralActivity => "electoral_activity",
            PolicyCategory::PoliticalAdvocacy => "political_advocacy",
            PolicyCategory::Lobbying => "lobbying",
            PolicyCategory::PolicyInfluence => "policy_influence",
        }
    }
}

impl fmt::Display for PolicyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layer produced a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyLayer {
    ExactCategory,
    PrimaryKeyword,
    Misspelling,
    PhrasePattern,
}

/// A non-blocking secondary keyword hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub term: String,
    pub category: PolicyCategory,
}

/// Result of evaluating a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PolicyVerdict {
    Allowed {
        advisories: Vec<Advisory>,
    },
    Blocked {
        category: PolicyCategory,
        matched_term: String,
        layer: PolicyLayer,
    },
}

impl PolicyVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, PolicyVerdict::Blocked { .. })
    }
}

/// The content policy gate. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentPolicyGate;

impl ContentPolicyGate {
    pub fn new() -> Self {
        Self
    }

    /// Classify an action descriptor
    pub fn evaluate(&self, descriptor: &str) -> PolicyVerdict {
        let normalized = descriptor.trim().to_lowercase();
        let tokens = tokenize(&normalized);

        if let Some(verdict) = self.check_exact(&normalized) {
            return verdict;
        }
        if let Some(verdict) = check_terms(&tokens, table::PRIMARY_KEYWORDS, PolicyLayer::PrimaryKeyword) {
            return verdict;
        }
        if let Some(verdict) = check_terms(&tokens, table::MISSPELLINGS, PolicyLayer::Misspelling) {
            return verdict;
        }
        if let Some(verdict) = self.check_phrases(&tokens) {
            return verdict;
        }

        let advisories = self.collect_advisories(&tokens);
        for advisory in &advisories {
            info!(
                term = %advisory.term,
                category = %advisory.category,
                "secondary policy keyword present (advisory only)"
            );
        }
        PolicyVerdict::Allowed { advisories }
    }

    fn check_exact(&self, normalized: &str) -> Option<PolicyVerdict> {
        table::PROHIBITED_CATEGORIES
            .iter()
            .find(|(term, _)| *term == normalized)
            .map(|(term, category)| blocked(*category, term, PolicyLayer::ExactCategory))
    }

    fn check_phrases(&self, tokens: &[&str]) -> Option<PolicyVerdict> {
        let content: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|t| !table::STOPWORDS.contains(t))
            .collect();
        table::PHRASE_PATTERNS
            .iter()
            .find(|(pattern, _)| phrase_matches(&content, pattern))
            .map(|(pattern, category)| blocked(*category, &pattern.join(" "), PolicyLayer::PhrasePattern))
    }

    fn collect_advisories(&self, tokens: &[&str]) -> Vec<Advisory> {
        let mut advisories: Vec<Advisory> = Vec::new();
        for token in tokens {
            if let Some((term, category)) = table::SECONDARY_KEYWORDS.iter().find(|(t, _)| t == token) {
                if !advisories.iter().any(|a| a.term == *term) {
                    advisories.push(Advisory {
                        term: term.to_string(),
                        category: *category,
                    });
                }
            }
        }
        advisories
    }
}

fn check_terms(
    tokens: &[&str],
    terms: &[(&str, PolicyCategory)],
    layer: PolicyLayer,
) -> Option<PolicyVerdict> {
    for token in tokens {
        if let Some((term, category)) = terms.iter().find(|(t, _)| t == token) {
            return Some(blocked(*category, term, layer));
        }
    }
    None
}

/// Whether `pattern` occurs in order in `tokens`, each entry at most
/// `MAX_PHRASE_GAP` tokens after the previous one
fn phrase_matches(tokens: &[&str], pattern: &[&str]) -> bool {
    let Some((first, rest)) = pattern.split_first() else {
        return false;
    };
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| *t == first)
        .any(|(start, _)| {
            let mut at = start;
            rest.iter().all(|entry| {
                let window_end = (at + 2 + table::MAX_PHRASE_GAP).min(tokens.len());
                match tokens[at + 1..window_end].iter().position(|t| t == entry) {
                    Some(offset) => {
                        at += 1 + offset;
                        true
                    }
                    None => false,
                }
            })
        })
}

fn blocked(category: PolicyCategory, term: &str, layer: PolicyLayer) -> PolicyVerdict {
    debug!(%category, term, ?layer, "descriptor blocked by content policy");
    PolicyVerdict::Blocked {
        category,
        matched_term: term.to_string(),
        layer,
    }
}

/// Split on anything that is not alphanumeric. Input must already be lowercase.
fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_blocked(descriptor: &str, category: PolicyCategory, layer: PolicyLayer) {
        match ContentPolicyGate::new().evaluate(descriptor) {
            PolicyVerdict::Blocked {
                category: c,
                layer: l,
                ..
            } => {
                assert_eq!(c, category, "category for {descriptor:?}");
                assert_eq!(l, layer, "layer for {descriptor:?}");
            }
            other => panic!("expected {descriptor:?} to be blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_category() {
        assert_blocked("electoral_activity", PolicyCategory::ElectoralActivity, PolicyLayer::ExactCategory);
        assert_blocked("  Policy Influence ", PolicyCategory::PolicyInfluence, PolicyLayer::ExactCategory);
        assert_blocked("lobbying", PolicyCategory::Lobbying, PolicyLayer::ExactCategory);
    }

    #[test]
    fn test_primary_keyword_case_insensitive() {
        assert_blocked("lobbying effort", PolicyCategory::Lobbying, PolicyLayer::PrimaryKeyword);
        assert_blocked("Hire a LOBBYIST", PolicyCategory::Lobbying, PolicyLayer::PrimaryKeyword);
        assert_blocked("fund the election-night party", PolicyCategory::ElectoralActivity, PolicyLayer::PrimaryKeyword);
    }

    #[test]
    fn test_word_boundaries_avoid_substring_hits() {
        let gate = ContentPolicyGate::new();
        assert!(!gate.evaluate("Selection committee review").is_blocked());
        assert!(!gate.evaluate("Renovate the hotel lobby").is_blocked());
        assert!(!gate.evaluate("Pay the electrician").is_blocked());
    }

    #[test]
    fn test_misspellings() {
        assert_blocked("lobbyng campaign", PolicyCategory::Lobbying, PolicyLayer::Misspelling);
        assert_blocked("donate to politcal cause", PolicyCategory::PoliticalAdvocacy, PolicyLayer::Misspelling);
    }

    #[test]
    fn test_phrase_patterns() {
        assert_blocked("Contact your representative about zoning", PolicyCategory::PolicyInfluence, PolicyLayer::PhrasePattern);
        assert_blocked("Ask readers to vote for the measure", PolicyCategory::ElectoralActivity, PolicyLayer::PhrasePattern);
    }

    #[test]
    fn test_phrase_patterns_tolerate_filler_words() {
        assert_blocked("Support the candidate for mayor", PolicyCategory::ElectoralActivity, PolicyLayer::PhrasePattern);
        assert_blocked(
            "Make a contribution to the mayor's campaign",
            PolicyCategory::ElectoralActivity,
            PolicyLayer::PhrasePattern,
        );
        assert_blocked("Donate to the campaign of the incumbent", PolicyCategory::ElectoralActivity, PolicyLayer::PhrasePattern);
        assert_blocked(
            "Lobby the city council to change zoning rules",
            PolicyCategory::Lobbying,
            PolicyLayer::PhrasePattern,
        );
        assert_blocked("She lobbies our state legislature", PolicyCategory::Lobbying, PolicyLayer::PhrasePattern);
    }

    #[test]
    fn test_phrase_gap_is_bounded() {
        let gate = ContentPolicyGate::new();
        // three content tokens between "support" and "candidate"
        assert!(!gate
            .evaluate("Support local library reading programs; interview each candidate")
            .is_blocked());
        // pattern order matters
        assert!(!gate.evaluate("Council meeting held in the hotel lobby").is_blocked());
    }

    #[test]
    fn test_phrase_matches_gap() {
        assert!(phrase_matches(&["lobby", "city", "council"], &["lobby", "council"]));
        assert!(phrase_matches(&["lobby", "x", "y", "council"], &["lobby", "council"]));
        assert!(!phrase_matches(&["lobby", "x", "y", "z", "council"], &["lobby", "council"]));
        assert!(!phrase_matches(&["lobby"], &["lobby", "council"]));
        assert!(!phrase_matches(&["council", "lobby"], &["lobby", "council"]));
    }

    #[test]
    fn test_secondary_keywords_are_advisory() {
        let verdict = ContentPolicyGate::new().evaluate("Renew the insurance policy with the government pension fund");
        match verdict {
            PolicyVerdict::Allowed { advisories } => {
                let terms: Vec<_> = advisories.iter().map(|a| a.term.as_str()).collect();
                assert_eq!(terms, vec!["policy", "government"]);
            }
            other => panic!("expected allowed, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_takes_precedence_over_keywords() {
        // "lobbying" is both a category and a primary keyword; the exact layer reports it
        assert_blocked("LOBBYING", PolicyCategory::Lobbying, PolicyLayer::ExactCategory);
    }

    #[test]
    fn test_clean_descriptor_allowed() {
        let verdict = ContentPolicyGate::new().evaluate("Fund open-source compiler research");
        assert_eq!(verdict, PolicyVerdict::Allowed { advisories: vec![] });
    }

    #[test]
    fn test_verdict_serializes_tagged() {
        let verdict = ContentPolicyGate::new().evaluate("lobbying effort");
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["verdict"], "blocked");
        assert_eq!(json["category"], "lobbying");
        assert_eq!(json["matched_term"], "lobbying");
    }
}
