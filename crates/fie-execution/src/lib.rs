//! FIE Execution - The fail-closed decision gate
//!
//! Every action request ends in exactly one [`Outcome`]:
//!
//! - `Blocked` when the descriptor trips the content policy, whatever the
//!   evidence says
//! - `DefaultedToInaction` when the citation confidence is below 95
//! - `Executed` otherwise, after the side effect has been applied
//!
//! The citation service and the asset ledger are external. They are reached
//! through [`CitationService`] and [`AssetLedger`], and their answers are
//! re-validated here.

pub mod citation;
pub mod gate;
pub mod ledger;
pub mod record;
pub mod treasury;

pub use citation::{hash_corpus, is_corpus_hash, CitationResolution, CitationService, StaticCitationService};
pub use gate::{ExecutionAuthority, ExecutionGate};
pub use ledger::{AssetLedger, InMemoryAssetLedger, LedgerCall};
pub use record::{ActionEffect, ActionRecord, ActionRequest, Outcome, MAX_DESCRIPTOR_LEN, MAX_ROYALTY_BPS};
pub use treasury::Treasury;
