//! Sunset state per principal

use std::fmt;

use fie_types::{ActorId, PrincipalId, Timestamp};
use serde::{Deserialize, Serialize};

/// Terminal license applied to every asset at relicensing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseCategory {
    /// CC0 dedication
    #[default]
    PublicDomain,
    /// CC BY
    PermissiveAttribution,
}

impl LicenseCategory {
    /// SPDX identifier handed to the asset ledger
    pub fn spdx(&self) -> &'static str {
        match self {
            LicenseCategory::PublicDomain => "CC0-1.0",
            LicenseCategory::PermissiveAttribution => "CC-BY-4.0",
        }
    }
}

impl fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spdx())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunsetStep {
    Initiate,
    Archive,
    FinalizeArchive,
    Relicense,
    Cluster,
    Complete,
}

impl SunsetStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SunsetStep::Initiate => "initiate",
            SunsetStep::Archive => "archive",
            SunsetStep::FinalizeArchive => "finalize_archive",
            SunsetStep::Relicense => "relicense",
            SunsetStep::Cluster => "cluster",
            SunsetStep::Complete => "complete",
        }
    }
}

impl fmt::Display for SunsetStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotone progress record. Exists only once the sunset has been initiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunsetRecord {
    pub principal: PrincipalId,
    /// Copied from the activation and never changed
    pub activated_at: Timestamp,
    pub initiated_at: Timestamp,
    pub initiated_by: ActorId,
    pub archive_batches: u32,
    pub archived_assets: Vec<String>,
    pub archived_at: Option<Timestamp>,
    pub license: Option<LicenseCategory>,
    pub relicensed_at: Option<Timestamp>,
    pub cluster_id: Option<String>,
    pub clustered_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl SunsetRecord {
    pub(crate) fn new(principal: PrincipalId, activated_at: Timestamp, initiated_by: ActorId, now: Timestamp) -> Self {
        Self {
            principal,
            activated_at,
            initiated_at: now,
            initiated_by,
            archive_batches: 0,
            archived_assets: Vec::new(),
            archived_at: None,
            license: None,
            relicensed_at: None,
            cluster_id: None,
            clustered_at: None,
            completed_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn is_relicensed(&self) -> bool {
        self.relicensed_at.is_some()
    }

    pub fn is_clustered(&self) -> bool {
        self.clustered_at.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn archived_items(&self) -> usize {
        self.archived_assets.len()
    }
}
