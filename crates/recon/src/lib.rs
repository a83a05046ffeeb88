//! `confronto-recon`: payroll summary vs. accounting ledger reconciliation.
//!
//! Pure engine crate: receives positioned tokens, ledger text and a mapping,
//! returns classified results. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod general;
pub mod layout;
pub mod ledger;
pub mod mapping;
pub mod matcher;
pub mod model;
pub mod money;
pub mod normalize;
pub mod summary;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use layout::Token;
pub use ledger::{parse_ledger, LedgerPostingRow};
pub use mapping::{Mapping, MappingLoad, MappingStatus};
pub use model::{MatchStatus, ReconInput, ReconResult};
pub use summary::{extract_summary, SummaryEventRow};
