//! Pipeline configuration from environment variables
//!
//! Loaded once in the binary and passed by value into each component; no
//! global configuration singleton.

use std::env;

/// Configuration for one pipeline run
///
/// Loaded from environment variables with sensible defaults. Every knob is
/// also overridable per call where a component takes an explicit parameter.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Directory the loader archives consumed input files into
    pub archive_dir: String,

    /// Directory report sinks write artifacts into
    pub report_dir: String,

    /// Aggregation window length in days (window ends today)
    pub window_days: i64,

    /// Number of top customers to keep
    pub top_n: usize,

    /// Percent-of-mean threshold for outlier detection
    pub anomaly_threshold_percent: f64,

    /// Z-score threshold for the generic daily-aggregate outlier test
    pub zscore_threshold: f64,

    /// Number of periods the trend classifier looks at
    pub trend_periods: usize,

    /// Deadline per pipeline stage in seconds; expiry fails the stage
    pub stage_deadline_secs: u64,

    /// When true, a FAIL validation outcome aborts the run
    pub strict_validation: bool,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `KPIFLOW_DB_PATH` (default: kpiflow.db)
    /// - `KPIFLOW_ARCHIVE_DIR` (default: data/archive)
    /// - `KPIFLOW_REPORT_DIR` (default: reports)
    /// - `KPIFLOW_WINDOW_DAYS` (default: 30)
    /// - `KPIFLOW_TOP_N` (default: 10)
    /// - `KPIFLOW_ANOMALY_THRESHOLD_PCT` (default: 20)
    /// - `KPIFLOW_ZSCORE_THRESHOLD` (default: 2.5)
    /// - `KPIFLOW_TREND_PERIODS` (default: 3)
    /// - `KPIFLOW_STAGE_DEADLINE_SECS` (default: 300)
    /// - `KPIFLOW_STRICT_VALIDATION` (default: false)
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("KPIFLOW_DB_PATH").unwrap_or_else(|_| "kpiflow.db".to_string()),

            archive_dir: env::var("KPIFLOW_ARCHIVE_DIR")
                .unwrap_or_else(|_| "data/archive".to_string()),

            report_dir: env::var("KPIFLOW_REPORT_DIR").unwrap_or_else(|_| "reports".to_string()),

            window_days: parse_env("KPIFLOW_WINDOW_DAYS", 30),
            top_n: parse_env("KPIFLOW_TOP_N", 10),
            anomaly_threshold_percent: parse_env("KPIFLOW_ANOMALY_THRESHOLD_PCT", 20.0),
            zscore_threshold: parse_env("KPIFLOW_ZSCORE_THRESHOLD", 2.5),
            trend_periods: parse_env("KPIFLOW_TREND_PERIODS", 3),
            stage_deadline_secs: parse_env("KPIFLOW_STAGE_DEADLINE_SECS", 300),
            strict_validation: parse_env("KPIFLOW_STRICT_VALIDATION", false),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: "kpiflow.db".to_string(),
            archive_dir: "data/archive".to_string(),
            report_dir: "reports".to_string(),
            window_days: 30,
            top_n: 10,
            anomaly_threshold_percent: 20.0,
            zscore_threshold: 2.5,
            trend_periods: 3,
            stage_deadline_secs: 300,
            strict_validation: false,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
