//! Statement-execution dispatch for the mallard SQL front end.
//!
//! The front end prefers prepared-statement execution for parameter binding
//! and plan reuse, but the embedded engine rewrites some constructs (`PIVOT`,
//! `UNPIVOT`, statement batches) into internal statement sequences that its
//! prepared API refuses. This crate decides, per submitted statement, which
//! path runs — and guarantees callers cannot observe the difference:
//!
//! - a lexical analyzer predicts obviously non-preparable shapes,
//! - a bounded cache remembers what the engine already taught us,
//! - the dispatcher attempts the prepared path optimistically and falls back
//!   to direct execution exactly once on a prepare-stage rejection,
//! - a result adapter gives both paths one schema/row-batch contract.

pub mod analyzer;
pub mod cache;
pub mod classify;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod result;

mod executor;
mod sqlscan;

// Re-export commonly used types.
pub use analyzer::{analyze, ExecutionHint};
pub use cache::{ClassificationCache, PlanDecision};
pub use classify::{AnalyticSignatures, ErrorSignatures};
pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use error::ExecutionError;
pub use fingerprint::{fingerprint, Fingerprint};
pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot};
pub use result::ResultSet;
