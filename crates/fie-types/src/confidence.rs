//! Evidentiary confidence on the integer scale [0, 100].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FieError, Result};

/// Minimum confidence at which an action may execute. Fixed at build time.
pub const CONFIDENCE_THRESHOLD: u8 = 95;

/// Upper bound of the confidence scale.
pub const MAX_CONFIDENCE: u8 = 100;

/// A validated confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_CONFIDENCE {
            return Err(FieError::InvalidConfidence { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this score clears [`CONFIDENCE_THRESHOLD`].
    pub fn meets_threshold(self) -> bool {
        self.0 >= CONFIDENCE_THRESHOLD
    }
}

impl TryFrom<u8> for Confidence {
    type Error = FieError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
