//! Build-time policy table.
//!
//! Terms are lowercase. Single-word entries are compared against whole
//! tokens, never substrings. Phrase entries are ordered token sequences
//! matched after [`STOPWORDS`] are dropped, with up to [`MAX_PHRASE_GAP`]
//! other tokens between consecutive entries.

use crate::PolicyCategory::{self, *};

/// Exact descriptor matches. Both the slug and the spaced form are accepted.
pub const PROHIBITED_CATEGORIES: &[(&str, PolicyCategory)] = &[
    ("electoral_activity", ElectoralActivity),
    ("electoral activity", ElectoralActivity),
    ("political_advocacy", PoliticalAdvocacy),
    ("political advocacy", PoliticalAdvocacy),
    ("lobbying", Lobbying),
    ("policy_influence", PolicyInfluence),
    ("policy influence", PolicyInfluence),
];

pub const PRIMARY_KEYWORDS: &[(&str, PolicyCategory)] = &[
    ("election", ElectoralActivity),
    ("elections", ElectoralActivity),
    ("electoral", ElectoralActivity),
    ("electioneering", ElectoralActivity),
    ("ballot", ElectoralActivity),
    ("ballots", ElectoralActivity),
    ("referendum", ElectoralActivity),
    ("voter", ElectoralActivity),
    ("voters", ElectoralActivity),
    ("political", PoliticalAdvocacy),
    ("politician", PoliticalAdvocacy),
    ("politicians", PoliticalAdvocacy),
    ("partisan", PoliticalAdvocacy),
    ("superpac", PoliticalAdvocacy),
    ("lobbying", Lobbying),
    ("lobbyist", Lobbying),
    ("lobbyists", Lobbying),
    ("lobbied", Lobbying),
    ("legislator", PolicyInfluence),
    ("legislators", PolicyInfluence),
    ("lawmaker", PolicyInfluence),
    ("lawmakers", PolicyInfluence),
    ("congressman", PolicyInfluence),
    ("congresswoman", PolicyInfluence),
    ("senator", PolicyInfluence),
    ("senators", PolicyInfluence),
];

pub const MISSPELLINGS: &[(&str, PolicyCategory)] = &[
    ("elektion", ElectoralActivity),
    ("electon", ElectoralActivity),
    ("ellection", ElectoralActivity),
    ("elecshun", ElectoralActivity),
    ("electorial", ElectoralActivity),
    ("elecoral", ElectoralActivity),
    ("balot", ElectoralActivity),
    ("politcal", PoliticalAdvocacy),
    ("poltical", PoliticalAdvocacy),
    ("pollitical", PoliticalAdvocacy),
    ("polticial", PoliticalAdvocacy),
    ("politican", PoliticalAdvocacy),
    ("lobying", Lobbying),
    ("lobbyng", Lobbying),
    ("lobbiing", Lobbying),
    ("lobyist", Lobbying),
    ("lobbiest", Lobbying),
    ("legistlator", PolicyInfluence),
    ("legislater", PolicyInfluence),
    ("senater", PolicyInfluence),
];

/// Tokens skipped before phrase matching
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "s", "my", "our", "your", "their", "his", "her", "its", "this", "that", "these",
    "those",
];

/// Other tokens tolerated between two consecutive phrase entries
pub const MAX_PHRASE_GAP: usize = 2;

pub const PHRASE_PATTERNS: &[(&[&str], PolicyCategory)] = &[
    (&["vote", "for"], ElectoralActivity),
    (&["vote", "against"], ElectoralActivity),
    (&["get", "out", "vote"], ElectoralActivity),
    (&["support", "candidate"], ElectoralActivity),
    (&["oppose", "candidate"], ElectoralActivity),
    (&["support", "incumbent"], ElectoralActivity),
    (&["oppose", "incumbent"], ElectoralActivity),
    (&["campaign", "contribution"], ElectoralActivity),
    (&["campaign", "donation"], ElectoralActivity),
    (&["contribution", "campaign"], ElectoralActivity),
    (&["contribute", "campaign"], ElectoralActivity),
    (&["donation", "campaign"], ElectoralActivity),
    (&["donate", "campaign"], ElectoralActivity),
    (&["fund", "campaign"], ElectoralActivity),
    (&["party", "platform"], PoliticalAdvocacy),
    (&["lobby", "council"], Lobbying),
    (&["lobby", "congress"], Lobbying),
    (&["lobby", "senate"], Lobbying),
    (&["lobby", "parliament"], Lobbying),
    (&["lobby", "legislature"], Lobbying),
    (&["lobby", "government"], Lobbying),
    (&["lobby", "officials"], Lobbying),
    (&["lobby", "mayor"], Lobbying),
    (&["lobbies", "council"], Lobbying),
    (&["lobbies", "congress"], Lobbying),
    (&["lobbies", "senate"], Lobbying),
    (&["lobbies", "parliament"], Lobbying),
    (&["lobbies", "legislature"], Lobbying),
    (&["lobbies", "government"], Lobbying),
    (&["lobbies", "officials"], Lobbying),
    (&["lobbies", "mayor"], Lobbying),
    (&["contact", "representative"], PolicyInfluence),
    (&["influence", "legislation"], PolicyInfluence),
    (&["influence", "policy"], PolicyInfluence),
    (&["draft", "legislation"], PolicyInfluence),
    (&["policy", "change", "advocacy"], PolicyInfluence),
];

/// Advisory-only terms. They share substrings or contexts with sensitive
/// terms but appear in ordinary descriptors too.
pub const SECONDARY_KEYWORDS: &[(&str, PolicyCategory)] = &[
    ("government", PolicyInfluence),
    ("policy", PolicyInfluence),
    ("legislation", PolicyInfluence),
    ("regulation", PolicyInfluence),
    ("congress", PolicyInfluence),
    ("parliament", PolicyInfluence),
    ("senate", PolicyInfluence),
    ("campaign", ElectoralActivity),
    ("candidate", ElectoralActivity),
    ("vote", ElectoralActivity),
    ("party", PoliticalAdvocacy),
    ("advocacy", PoliticalAdvocacy),
];
