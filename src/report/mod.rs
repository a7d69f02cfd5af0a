//! Reporting sinks
//!
//! The pipeline hands every sink the same `RunReport`; rendering format is
//! the sink's concern. Sink failures are best-effort by contract: the
//! orchestrator logs them and never rolls back committed KPI data.

pub mod csv_summary;
pub mod jsonl;
pub mod text;

pub use csv_summary::CsvSummarySink;
pub use jsonl::JsonlReportSink;
pub use text::TextReportSink;

use crate::analytics::outlier::OutlierPoint;
use crate::analytics::trend::TrendReading;
use crate::model::{DateWindow, KpiResult, Region, ValidationOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Input contract of every reporting sink: the full output of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub window: DateWindow,
    pub kpi_results: Vec<KpiResult>,
    pub validation: Vec<ValidationOutcome>,
    pub revenue_outliers: Vec<OutlierPoint>,
    pub monthly_trend: TrendReading,
    pub insights: Vec<String>,
    pub regions: Vec<Region>,
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Csv(csv::Error),
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err)
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err)
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "IO error: {}", e),
            ReportError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ReportError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}

/// Backend trait for rendering a run report
#[async_trait]
pub trait ReportSink: Send {
    /// Render one run report to the sink's output
    async fn write_report(&mut self, report: &RunReport) -> Result<(), ReportError>;

    /// Sink name for logging
    fn backend_type(&self) -> &'static str;
}
