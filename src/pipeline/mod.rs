//! Pipeline orchestration
//!
//! One engine drives a full run through its stages:
//!
//! ```text
//! Idle -> Loading -> Validating -> Aggregating -> Reporting -> Done
//!              \          \             \              \
//!               +----------+-------------+--------------+--> Failed
//! ```
//!
//! Loading is skipped when no input file is given. Each stage runs under a
//! deadline; expiry fails the run. Validation failures are advisory unless
//! strict mode is on. Reporting is best-effort: sink errors are logged and
//! never fail a run whose KPI data is already committed.

pub mod engine;
pub mod error;

pub use engine::{PipelineEngine, PipelineState};
pub use error::PipelineError;
