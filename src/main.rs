//! kpiflow - sales analytics ETL pipeline
//!
//! Loads tabular sales transactions into a record store, computes KPI
//! aggregates over a date window, flags outliers and trends in the KPI
//! series, and renders text/CSV/JSONL reports.
//!
//! ```text
//! CSV file -> CsvLoader -> RecordStore (SQLite or in-memory)
//!     |
//! PipelineEngine (Idle -> Loading -> Validating -> Aggregating -> Reporting -> Done)
//!     |
//! KpiAggregator -> KpiResult rows (one transaction per KPI family)
//!     |
//! OutlierDetector + TrendClassifier + insights
//!     |
//! ReportSink (text / CSV / JSONL)
//! ```

pub mod analytics;
pub mod config;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod store;

pub use analytics::{DataValidator, KpiAggregator, OutlierDetector, TrendClassifier};
pub use config::PipelineConfig;
pub use loader::CsvLoader;
pub use model::{DateWindow, KpiName, KpiResult, Region, Transaction};
pub use pipeline::{PipelineEngine, PipelineError, PipelineState};
pub use report::{ReportSink, RunReport};
pub use store::{InMemoryRecordStore, RecordStore, SqliteRecordStore, StoreError};
