//! Sunset workflow

use std::collections::HashMap;

use fie_execution::{AssetLedger, CitationService};
use fie_types::{ActorId, FieError, PrincipalId, Result, Timestamp, DAY_SECS, SUNSET_DURATION_SECS};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::record::{LicenseCategory, SunsetRecord, SunsetStep};

/// Most assets accepted by a single archive call
pub const MAX_ARCHIVE_BATCH: usize = 50;

/// After this long past initiation, non-operators may drive the remaining steps
pub const OPERATOR_GRACE_SECS: i64 = 30 * DAY_SECS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunsetPolicy {
    pub operator_grace_secs: i64,
    /// License used when the caller does not choose one
    pub default_license: LicenseCategory,
}

impl Default for SunsetPolicy {
    fn default() -> Self {
        Self {
            operator_grace_secs: OPERATOR_GRACE_SECS,
            default_license: LicenseCategory::PublicDomain,
        }
    }
}

impl SunsetPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.operator_grace_secs < 0 {
            return Err(FieError::InvalidPolicy {
                reason: "operator_grace_secs cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

pub struct SunsetCoordinator {
    policy: SunsetPolicy,
    operator: ActorId,
    records: HashMap<PrincipalId, SunsetRecord>,
}

impl SunsetCoordinator {
    pub fn new(policy: SunsetPolicy, operator: ActorId) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            operator,
            records: HashMap::new(),
        })
    }

    pub fn policy(&self) -> &SunsetPolicy {
        &self.policy
    }

    pub fn operator(&self) -> &ActorId {
        &self.operator
    }

    /// Earliest time the sunset may be initiated
    pub fn due_at(activated_at: Timestamp) -> Timestamp {
        activated_at.saturating_add(SUNSET_DURATION_SECS)
    }

    /// Permissionless once the fixed duration has elapsed since activation
    pub fn initiate(
        &mut self,
        caller: &ActorId,
        principal: &PrincipalId,
        activated_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<&SunsetRecord> {
        let activated_at = activated_at.ok_or_else(|| FieError::NotActivated {
            principal: principal.to_string(),
        })?;
        if self.records.contains_key(principal) {
            warn!(principal = %principal, "sunset already initiated");
            return Err(repeated(SunsetStep::Initiate));
        }
        let due_at = Self::due_at(activated_at);
        if now < due_at {
            return Err(FieError::SunsetNotDue { due_at, now });
        }

        info!(principal = %principal, by = %caller, activated_at, "sunset initiated, execution halted");
        let record = SunsetRecord::new(principal.clone(), activated_at, caller.clone(), now);
        Ok(&*self.records.entry(principal.clone()).or_insert(record))
    }

    /// Archive one batch of assets; returns the running total
    pub fn archive(&mut self, caller: &ActorId, principal: &PrincipalId, assets: Vec<String>, now: Timestamp) -> Result<usize> {
        if assets.is_empty() {
            return Err(FieError::invalid_input("assets", "batch must not be empty"));
        }
        if assets.len() > MAX_ARCHIVE_BATCH {
            return Err(FieError::BatchTooLarge {
                size: assets.len(),
                max: MAX_ARCHIVE_BATCH,
            });
        }
        if assets.iter().any(|a| a.trim().is_empty()) {
            return Err(FieError::invalid_input("assets", "asset ids must not be empty"));
        }
        let record = self.step(caller, principal, SunsetStep::Archive, now)?;
        if record.is_archived() {
            return Err(repeated(SunsetStep::FinalizeArchive));
        }

        record.archive_batches += 1;
        record.archived_assets.extend(assets);
        info!(principal = %principal, batch = record.archive_batches, total = record.archived_items(), "archive batch stored");
        Ok(record.archived_items())
    }

    /// Lock the archive. Requires at least one batch.
    pub fn finalize_archive(&mut self, caller: &ActorId, principal: &PrincipalId, now: Timestamp) -> Result<()> {
        let record = self.step(caller, principal, SunsetStep::FinalizeArchive, now)?;
        if record.is_archived() {
            return Err(repeated(SunsetStep::FinalizeArchive));
        }
        if record.archive_batches == 0 {
            return Err(out_of_order(SunsetStep::FinalizeArchive, SunsetStep::Archive));
        }
        record.archived_at = Some(now);
        info!(principal = %principal, items = record.archived_items(), "archive finalized");
        Ok(())
    }

    /// Apply the terminal license to every asset
    pub fn relicense(
        &mut self,
        caller: &ActorId,
        principal: &PrincipalId,
        license: Option<LicenseCategory>,
        ledger: &dyn AssetLedger,
        now: Timestamp,
    ) -> Result<LicenseCategory> {
        let license = license.unwrap_or(self.policy.default_license);
        let record = self.step(caller, principal, SunsetStep::Relicense, now)?;
        if record.is_relicensed() {
            return Err(repeated(SunsetStep::Relicense));
        }
        if !record.is_archived() {
            return Err(out_of_order(SunsetStep::Relicense, SunsetStep::FinalizeArchive));
        }

        record.license = Some(license);
        record.relicensed_at = Some(now);
        if let Err(e) = ledger.relicense_all(principal, license.spdx()) {
            record.license = None;
            record.relicensed_at = None;
            warn!(principal = %principal, %license, error = %e, "relicensing failed; step rolled back");
            return Err(e);
        }
        info!(principal = %principal, %license, "assets relicensed");
        Ok(license)
    }

    /// Optional: have the citation service group the archive into a cluster
    pub fn cluster(
        &mut self,
        caller: &ActorId,
        principal: &PrincipalId,
        citations: &dyn CitationService,
        now: Timestamp,
    ) -> Result<String> {
        let record = self.step(caller, principal, SunsetStep::Cluster, now)?;
        if record.is_clustered() {
            return Err(repeated(SunsetStep::Cluster));
        }
        if !record.is_relicensed() {
            return Err(out_of_order(SunsetStep::Cluster, SunsetStep::Relicense));
        }

        let cluster_id = citations.cluster(principal, &record.archived_assets)?;
        record.cluster_id = Some(cluster_id.clone());
        record.clustered_at = Some(now);
        info!(principal = %principal, cluster = %cluster_id, "archive clustered");
        Ok(cluster_id)
    }

    pub fn complete(&mut self, caller: &ActorId, principal: &PrincipalId, now: Timestamp) -> Result<()> {
        let record = self.step(caller, principal, SunsetStep::Complete, now)?;
        if !record.is_relicensed() {
            return Err(out_of_order(SunsetStep::Complete, SunsetStep::Relicense));
        }
        record.completed_at = Some(now);
        info!(principal = %principal, "sunset completed");
        Ok(())
    }

    pub fn record(&self, principal: &PrincipalId) -> Option<&SunsetRecord> {
        self.records.get(principal)
    }

    /// True once initiated; the gate never reopens
    pub fn is_halted(&self, principal: &PrincipalId) -> bool {
        self.records.contains_key(principal)
    }

    /// Look up an initiated, not yet completed record and check the caller may drive it
    fn step(&mut self, caller: &ActorId, principal: &PrincipalId, step: SunsetStep, now: Timestamp) -> Result<&mut SunsetRecord> {
        let grace = self.policy.operator_grace_secs;
        let is_operator = caller == &self.operator;
        let record = self
            .records
            .get_mut(principal)
            .ok_or_else(|| out_of_order(step, SunsetStep::Initiate))?;
        if record.is_completed() {
            return Err(repeated(SunsetStep::Complete));
        }
        if !is_operator && now < record.initiated_at.saturating_add(grace) {
            return Err(FieError::unauthorized(caller, format!("{} before the operator grace period ends", step)));
        }
        Ok(record)
    }
}

fn repeated(step: SunsetStep) -> FieError {
    FieError::SunsetStepRepeated {
        step: step.to_string(),
    }
}

fn out_of_order(attempted: SunsetStep, required: SunsetStep) -> FieError {
    FieError::SunsetOutOfOrder {
        attempted: attempted.to_string(),
        required: required.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use fie_execution::{InMemoryAssetLedger, LedgerCall, StaticCitationService};

    use super::*;

    const ACTIVATED: Timestamp = 1_000;

    struct Fixture {
        coord: SunsetCoordinator,
        operator: ActorId,
        principal: PrincipalId,
        ledger: InMemoryAssetLedger,
        citations: StaticCitationService,
    }

    fn fixture() -> Fixture {
        let operator = ActorId::new();
        Fixture {
            coord: SunsetCoordinator::new(SunsetPolicy::default(), operator.clone()).unwrap(),
            operator,
            principal: PrincipalId::new(),
            ledger: InMemoryAssetLedger::new(),
            citations: StaticCitationService::new("h"),
        }
    }

    fn due() -> Timestamp {
        ACTIVATED + SUNSET_DURATION_SECS
    }

    fn assets(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("asset-{i}")).collect()
    }

    #[test]
    fn test_initiation_boundary() {
        let mut f = fixture();
        let anyone = ActorId::new();
        let err = f.coord.initiate(&anyone, &f.principal, Some(ACTIVATED), due() - 1).unwrap_err();
        assert_eq!(
            err,
            FieError::SunsetNotDue {
                due_at: due(),
                now: due() - 1
            }
        );
        assert!(!f.coord.is_halted(&f.principal));

        let record = f.coord.initiate(&anyone, &f.principal, Some(ACTIVATED), due()).unwrap();
        assert_eq!(record.initiated_by, anyone);
        assert!(f.coord.is_halted(&f.principal));
    }

    #[test]
    fn test_initiation_requires_activation_and_happens_once() {
        let mut f = fixture();
        let err = f.coord.initiate(&f.operator, &f.principal, None, due()).unwrap_err();
        assert!(matches!(err, FieError::NotActivated { .. }));

        f.coord.initiate(&f.operator, &f.principal, Some(ACTIVATED), due()).unwrap();
        let before = f.coord.record(&f.principal).cloned();
        let err = f.coord.initiate(&f.operator, &f.principal, Some(ACTIVATED), due() + 5).unwrap_err();
        assert!(matches!(err, FieError::SunsetStepRepeated { .. }));
        assert_eq!(f.coord.record(&f.principal).cloned(), before);
    }

    #[test]
    fn test_full_workflow_in_order() {
        let mut f = fixture();
        let op = f.operator.clone();
        let p = f.principal.clone();
        let t = due();
        f.coord.initiate(&op, &p, Some(ACTIVATED), t).unwrap();
        assert_eq!(f.coord.archive(&op, &p, assets(50), t).unwrap(), 50);
        assert_eq!(f.coord.archive(&op, &p, assets(3), t).unwrap(), 53);
        f.coord.finalize_archive(&op, &p, t).unwrap();
        assert_eq!(f.coord.relicense(&op, &p, None, &f.ledger, t).unwrap(), LicenseCategory::PublicDomain);
        let cluster = f.coord.cluster(&op, &p, &f.citations, t).unwrap();
        f.coord.complete(&op, &p, t).unwrap();

        let record = f.coord.record(&p).unwrap();
        assert_eq!(record.archive_batches, 2);
        assert_eq!(record.cluster_id, Some(cluster));
        assert!(record.is_completed());
        assert_eq!(
            f.ledger.calls(),
            vec![LedgerCall::RelicenseAll {
                principal: p.clone(),
                license: "CC0-1.0".to_string()
            }]
        );
    }

    #[test]
    fn test_out_of_order_steps_rejected() {
        let mut f = fixture();
        let op = f.operator.clone();
        let p = f.principal.clone();
        let t = due();

        let err = f.coord.archive(&op, &p, assets(1), t).unwrap_err();
        assert!(matches!(err, FieError::SunsetOutOfOrder { .. }));

        f.coord.initiate(&op, &p, Some(ACTIVATED), t).unwrap();
        let err = f.coord.finalize_archive(&op, &p, t).unwrap_err();
        assert_eq!(
            err,
            FieError::SunsetOutOfOrder {
                attempted: "finalize_archive".into(),
                required: "archive".into()
            }
        );
        f.coord.archive(&op, &p, assets(1), t).unwrap();
        let err = f.coord.relicense(&op, &p, None, &f.ledger, t).unwrap_err();
        assert!(matches!(err, FieError::SunsetOutOfOrder { .. }));
        let err = f.coord.complete(&op, &p, t).unwrap_err();
        assert!(matches!(err, FieError::SunsetOutOfOrder { .. }));
        assert!(f.ledger.calls().is_empty());
    }

    #[test]
    fn test_steps_not_repeatable() {
        let mut f = fixture();
        let op = f.operator.clone();
        let p = f.principal.clone();
        let t = due();
        f.coord.initiate(&op, &p, Some(ACTIVATED), t).unwrap();
        f.coord.archive(&op, &p, assets(2), t).unwrap();
        f.coord.finalize_archive(&op, &p, t).unwrap();

        assert!(matches!(
            f.coord.archive(&op, &p, assets(1), t),
            Err(FieError::SunsetStepRepeated { .. })
        ));
        assert!(f.coord.finalize_archive(&op, &p, t).is_err());
        f.coord.relicense(&op, &p, Some(LicenseCategory::PermissiveAttribution), &f.ledger, t).unwrap();
        assert!(f.coord.relicense(&op, &p, None, &f.ledger, t).is_err());
        f.coord.complete(&op, &p, t).unwrap();

        let before = f.coord.record(&p).cloned();
        assert!(matches!(f.coord.complete(&op, &p, t), Err(FieError::SunsetStepRepeated { .. })));
        assert!(f.coord.cluster(&op, &p, &f.citations, t).is_err());
        assert_eq!(f.coord.record(&p).cloned(), before);
        assert_eq!(f.ledger.calls().len(), 1);
    }

    #[test]
    fn test_batch_bounds() {
        let mut f = fixture();
        let op = f.operator.clone();
        let p = f.principal.clone();
        f.coord.initiate(&op, &p, Some(ACTIVATED), due()).unwrap();
        assert!(matches!(
            f.coord.archive(&op, &p, assets(MAX_ARCHIVE_BATCH + 1), due()),
            Err(FieError::BatchTooLarge { size: 51, max: 50 })
        ));
        assert!(matches!(
            f.coord.archive(&op, &p, vec![], due()),
            Err(FieError::InvalidInput { .. })
        ));
        assert!(f.coord.archive(&op, &p, vec![" ".into()], due()).is_err());
        assert_eq!(f.coord.record(&p).unwrap().archive_batches, 0);
    }

    #[test]
    fn test_operator_grace_period() {
        let mut f = fixture();
        let stranger = ActorId::new();
        let p = f.principal.clone();
        let t = due();
        f.coord.initiate(&stranger, &p, Some(ACTIVATED), t).unwrap();

        let err = f.coord.archive(&stranger, &p, assets(1), t + OPERATOR_GRACE_SECS - 1).unwrap_err();
        assert!(matches!(err, FieError::Unauthorized { .. }));
        assert!(f.coord.archive(&stranger, &p, assets(1), t + OPERATOR_GRACE_SECS).is_ok());
    }

    #[test]
    fn test_ledger_failure_leaves_relicense_undone() {
        let mut f = fixture();
        let op = f.operator.clone();
        let p = f.principal.clone();
        let t = due();
        f.coord.initiate(&op, &p, Some(ACTIVATED), t).unwrap();
        f.coord.archive(&op, &p, assets(1), t).unwrap();
        f.coord.finalize_archive(&op, &p, t).unwrap();

        f.ledger.set_failing(true);
        assert!(matches!(
            f.coord.relicense(&op, &p, None, &f.ledger, t),
            Err(FieError::AssetLedger { .. })
        ));
        let record = f.coord.record(&p).unwrap();
        assert!(!record.is_relicensed());
        assert_eq!(record.license, None);
        let err = f.coord.complete(&op, &p, t).unwrap_err();
        assert!(matches!(err, FieError::SunsetOutOfOrder { .. }));

        f.ledger.set_failing(false);
        assert_eq!(
            f.coord.relicense(&op, &p, None, &f.ledger, t).unwrap(),
            LicenseCategory::PublicDomain
        );
        let record = f.coord.record(&p).unwrap();
        assert_eq!(record.license, Some(LicenseCategory::PublicDomain));
        assert_eq!(record.relicensed_at, Some(t));
    }
}
