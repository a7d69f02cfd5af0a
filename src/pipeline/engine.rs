//! Pipeline engine: staged orchestration of one analytics run

use crate::analytics::{
    DataValidator, InsightGenerator, KpiAggregator, OutlierDetector, TrendClassifier,
};
use crate::config::PipelineConfig;
use crate::loader::CsvLoader;
use crate::model::{DateWindow, KpiName, KpiResult, TransactionFilter, ValidationOutcome, ValidationStatus};
use crate::pipeline::PipelineError;
use crate::report::{ReportSink, RunReport};
use crate::store::RecordStore;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Validating,
    Aggregating,
    Reporting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Loading => "Loading",
            PipelineState::Validating => "Validating",
            PipelineState::Aggregating => "Aggregating",
            PipelineState::Reporting => "Reporting",
            PipelineState::Done => "Done",
            PipelineState::Failed => "Failed",
        }
    }
}

pub struct PipelineEngine {
    store: Arc<dyn RecordStore>,
    sinks: Vec<Box<dyn ReportSink>>,
    config: PipelineConfig,
    state: PipelineState,
}

impl PipelineEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sinks: Vec<Box<dyn ReportSink>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            sinks,
            config,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run the full pipeline
    ///
    /// With `csv_file` set, the run starts by loading that file; without it,
    /// the run works from data already in the store. Any stage error moves
    /// the engine to Failed; KPI batches committed before the failure stay
    /// committed.
    pub async fn run(&mut self, csv_file: Option<&Path>) -> Result<RunReport, PipelineError> {
        log::info!(
            "🚀 Pipeline run starting (backend: {}, window: {} days)",
            self.store.backend_type(),
            self.config.window_days
        );

        match self.run_stages(csv_file).await {
            Ok(report) => {
                self.state = PipelineState::Done;
                log::info!("✅ Pipeline run complete ({} KPI rows)", report.kpi_results.len());
                Ok(report)
            }
            Err(err) => {
                log::error!("❌ Pipeline failed in {} stage: {}", self.state.as_str(), err);
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self, csv_file: Option<&Path>) -> Result<RunReport, PipelineError> {
        let deadline = Duration::from_secs(self.config.stage_deadline_secs);
        let window = DateWindow::last_days(self.config.window_days);

        if let Some(path) = csv_file {
            self.state = PipelineState::Loading;
            let loader = CsvLoader::new(self.store.clone(), &self.config.archive_dir);
            timeout(deadline, loader.load_sales_data(path))
                .await
                .map_err(|_| self.stage_timeout("loading"))??;
        }

        self.state = PipelineState::Validating;
        let validation = timeout(deadline, self.validate(window))
            .await
            .map_err(|_| self.stage_timeout("validating"))??;

        self.state = PipelineState::Aggregating;
        let kpi_results = timeout(deadline, self.aggregate(window))
            .await
            .map_err(|_| self.stage_timeout("aggregating"))??;

        self.state = PipelineState::Reporting;
        let report = timeout(deadline, self.report(window, kpi_results, validation))
            .await
            .map_err(|_| self.stage_timeout("reporting"))??;

        Ok(report)
    }

    fn stage_timeout(&self, stage: &'static str) -> PipelineError {
        PipelineError::StageTimeout {
            stage,
            deadline_secs: self.config.stage_deadline_secs,
        }
    }

    /// Validation stage: advisory unless strict mode is on
    async fn validate(
        &self,
        window: DateWindow,
    ) -> Result<Vec<ValidationOutcome>, PipelineError> {
        let validator = DataValidator::new(self.store.clone());
        let outcomes = validator.validate_all(Some(window)).await?;

        let failed_checks: Vec<String> = outcomes
            .iter()
            .filter(|o| o.status == ValidationStatus::Fail)
            .map(|o| o.check_name.clone())
            .collect();

        if !failed_checks.is_empty() {
            if self.config.strict_validation {
                return Err(PipelineError::Validation { failed_checks });
            }
            log::warn!(
                "⚠️  {} validation check(s) failed, continuing (strict mode off): {}",
                failed_checks.len(),
                failed_checks.join(", ")
            );
        }

        Ok(outcomes)
    }

    /// Aggregation stage: one store transaction per KPI family
    ///
    /// Families committed before a failure stay committed; the failing
    /// family's batch rolls back as a unit.
    async fn aggregate(&self, window: DateWindow) -> Result<Vec<KpiResult>, PipelineError> {
        let transactions = self
            .store
            .query(&TransactionFilter::in_window(window))
            .await?;
        log::info!(
            "📊 Aggregating {} transactions ({} to {})",
            transactions.len(),
            window.start,
            window.end
        );

        let aggregator = KpiAggregator::new(self.config.top_n);
        let calculated_at = Utc::now();
        let mut kpi_results = Vec::new();

        for family in KpiName::all() {
            let rows = aggregator.compute_family(family, &transactions, window, calculated_at);
            if rows.is_empty() {
                log::info!("   ├─ {}: no data", family.as_str());
                continue;
            }
            let written = self.store.write_kpi_results(&rows).await?;
            log::info!("   ├─ {}: {} rows", family.as_str(), written);
            kpi_results.extend(rows);
        }
        log::info!("   └─ {} KPI rows total", kpi_results.len());

        Ok(kpi_results)
    }

    /// Reporting stage: insights plus best-effort sink fan-out
    async fn report(
        &mut self,
        window: DateWindow,
        kpi_results: Vec<KpiResult>,
        validation: Vec<ValidationOutcome>,
    ) -> Result<RunReport, PipelineError> {
        let generator = InsightGenerator::new(
            self.store.clone(),
            OutlierDetector::new(
                self.config.anomaly_threshold_percent,
                self.config.zscore_threshold,
            ),
            TrendClassifier::new(self.config.trend_periods),
        );
        let insights = generator.generate_summary().await?;
        let regions = self.store.known_regions().await?;

        let report = RunReport {
            generated_at: Utc::now(),
            window,
            kpi_results,
            validation,
            revenue_outliers: insights.revenue_outliers,
            monthly_trend: insights.monthly_trend,
            insights: insights.lines,
            regions,
        };

        for sink in self.sinks.iter_mut() {
            match sink.write_report(&report).await {
                Ok(()) => log::info!("   ├─ {} sink written", sink.backend_type()),
                Err(e) => log::warn!("⚠️  {} sink failed: {}", sink.backend_type(), e),
            }
        }

        Ok(report)
    }
}
