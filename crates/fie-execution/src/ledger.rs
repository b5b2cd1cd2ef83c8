//! Asset and licensing ledger boundary

use fie_types::{FieError, PrincipalId, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// External ledger that moves value and manages IP licenses
pub trait AssetLedger: Send + Sync {
    fn transfer(&self, principal: &PrincipalId, recipient: &str, amount: u64) -> Result<()>;

    fn issue_license(
        &self,
        principal: &PrincipalId,
        licensee: &str,
        asset: &str,
        royalty_bps: u16,
        duration_secs: i64,
    ) -> Result<()>;

    /// Move every asset of the principal to a terminal license
    fn relicense_all(&self, principal: &PrincipalId, license: &str) -> Result<()>;
}

/// A call the in-memory ledger accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum LedgerCall {
    Transfer {
        principal: PrincipalId,
        recipient: String,
        amount: u64,
    },
    IssueLicense {
        principal: PrincipalId,
        licensee: String,
        asset: String,
        royalty_bps: u16,
        duration_secs: i64,
    },
    RelicenseAll {
        principal: PrincipalId,
        license: String,
    },
}

/// In-memory ledger that records calls and can be told to fail
#[derive(Debug, Default)]
pub struct InMemoryAssetLedger {
    calls: Mutex<Vec<LedgerCall>>,
    failing: Mutex<bool>,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().clone()
    }

    fn accept(&self, call: LedgerCall) -> Result<()> {
        if *self.failing.lock() {
            return Err(FieError::AssetLedger {
                message: "ledger rejected the call".to_string(),
            });
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn transfer(&self, principal: &PrincipalId, recipient: &str, amount: u64) -> Result<()> {
        self.accept(LedgerCall::Transfer {
            principal: principal.clone(),
            recipient: recipient.to_string(),
            amount,
        })
    }

    fn issue_license(
        &self,
        principal: &PrincipalId,
        licensee: &str,
        asset: &str,
        royalty_bps: u16,
        duration_secs: i64,
    ) -> Result<()> {
        self.accept(LedgerCall::IssueLicense {
            principal: principal.clone(),
            licensee: licensee.to_string(),
            asset: asset.to_string(),
            royalty_bps,
            duration_secs,
        })
    }

    fn relicense_all(&self, principal: &PrincipalId, license: &str) -> Result<()> {
        self.accept(LedgerCall::RelicenseAll {
            principal: principal.clone(),
            license: license.to_string(),
        })
    }
}
