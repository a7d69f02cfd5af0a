//! Analytics core - KPI aggregation and series analysis
//!
//! ```text
//! RecordStore -> Vec<Transaction>
//!     |
//! KpiAggregator (five KPI families, one batch per family)
//!     |
//! KpiResult rows -> RecordStore
//!     |
//! OutlierDetector (percent-of-mean, z-score)
//! TrendClassifier (first-vs-last over N periods)
//! DataValidator (integrity checks, advisory)
//!     |
//! insights (narrative strings for the report)
//! ```

pub mod aggregator;
pub mod insights;
pub mod outlier;
pub mod trend;
pub mod validator;

pub use aggregator::KpiAggregator;
pub use insights::InsightGenerator;
pub use outlier::{OutlierDetector, OutlierPoint};
pub use trend::{TrendClassifier, TrendDirection, TrendReading};
pub use validator::DataValidator;
