//! Run Pipeline - full analytics run against SQLite
//!
//! Loads an optional CSV input, validates, aggregates KPIs over the
//! configured window, and writes text/CSV/JSONL reports.
//!
//! Usage:
//!   cargo run --release --bin run_pipeline [input.csv]
//!
//! Environment variables:
//!   KPIFLOW_DB_PATH - SQLite database path (default: kpiflow.db)
//!   KPIFLOW_ARCHIVE_DIR - Archive directory for consumed inputs
//!   KPIFLOW_REPORT_DIR - Report output directory
//!   KPIFLOW_WINDOW_DAYS - Aggregation window length (default: 30)
//!   KPIFLOW_STRICT_VALIDATION - Abort on failed checks (default: false)

use dotenv::dotenv;
use kpiflow::config::PipelineConfig;
use kpiflow::pipeline::PipelineEngine;
use kpiflow::report::{CsvSummarySink, JsonlReportSink, ReportSink, TextReportSink};
use kpiflow::store::{RecordStore, SqliteRecordStore};
use log::{error, info};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = PipelineConfig::from_env();
    let csv_file: Option<PathBuf> = env::args().nth(1).map(PathBuf::from);

    info!("🚀 Sales analytics pipeline");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Window: {} days", config.window_days);
    info!("   ├─ Reports: {}", config.report_dir);
    match &csv_file {
        Some(path) => info!("   └─ Input: {}", path.display()),
        None => info!("   └─ Input: none (aggregating existing data)"),
    }

    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(&config.db_path)?);

    let sinks: Vec<Box<dyn ReportSink>> = vec![
        Box::new(TextReportSink::new(&config.report_dir)),
        Box::new(CsvSummarySink::new(&config.report_dir)),
        Box::new(JsonlReportSink::new(&config.report_dir)),
    ];

    let mut engine = PipelineEngine::new(store, sinks, config);
    match engine.run(csv_file.as_deref()).await {
        Ok(report) => {
            info!("✅ Run finished: {} KPI rows", report.kpi_results.len());
            for line in &report.insights {
                info!("   {}", line);
            }
            Ok(())
        }
        Err(err) => {
            error!("❌ Run failed: {}", err);
            std::process::exit(1);
        }
    }
}
