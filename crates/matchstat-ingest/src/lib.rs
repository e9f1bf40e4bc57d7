//! Identity resolution, persistence and reporting for matchstat.
//!
//! [`Pipeline`] takes one match document from HTML to stored
//! [`StatRecord`]s against any [`MatchStore`] backend and returns a
//! [`DocumentReport`]. The `matchstat` binary wraps it for batches of files.
//!
//! [`StatRecord`]: matchstat_core::record::StatRecord
//! [`MatchStore`]: matchstat_core::store::MatchStore

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod upsert;

pub use config::IngestConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use report::{DocumentReport, ReportError, UnresolvedRow};
