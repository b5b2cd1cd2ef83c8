//! FIE Sunset - Ending the mandate
//!
//! Once [`SUNSET_DURATION_SECS`] have passed since activation, anyone may
//! initiate the sunset. Initiation halts the execution gate for good. The
//! remaining steps run strictly in order, each exactly once:
//!
//! ```text
//! initiate -> archive (1..n batches) -> finalize_archive -> relicense
//!          -> [cluster] -> complete
//! ```
//!
//! Steps after initiation belong to the operator, but after
//! [`OPERATOR_GRACE_SECS`] anyone may drive them so an absent operator cannot
//! stall termination.

pub mod coordinator;
pub mod record;

pub use coordinator::{SunsetCoordinator, SunsetPolicy, MAX_ARCHIVE_BATCH, OPERATOR_GRACE_SECS};
pub use fie_types::SUNSET_DURATION_SECS;
pub use record::{LicenseCategory, SunsetRecord, SunsetStep};
