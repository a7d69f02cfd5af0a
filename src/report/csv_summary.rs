//! CSV summary of all KPI rows for one run

use super::{ReportError, ReportSink, RunReport};
use async_trait::async_trait;
use std::path::PathBuf;

pub struct CsvSummarySink {
    output_dir: PathBuf,
}

impl CsvSummarySink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl ReportSink for CsvSummarySink {
    async fn write_report(&mut self, report: &RunReport) -> Result<(), ReportError> {
        if report.kpi_results.is_empty() {
            log::warn!("⚠️  No KPI data found, skipping CSV summary");
            return Ok(());
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let filename = format!("kpi_summary_{}.csv", report.generated_at.format("%Y%m%d"));
        let path = self.output_dir.join(filename);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "KPI_NAME",
            "KPI_DATE",
            "KPI_VALUE",
            "REGION_ID",
            "ENTITY_ID",
            "CALCULATION_DATE",
        ])?;

        for row in &report.kpi_results {
            writer.write_record([
                row.kpi_name.as_str().to_string(),
                row.kpi_date.to_string(),
                row.kpi_value.to_string(),
                row.region_id.map(|v| v.to_string()).unwrap_or_default(),
                row.entity_id.map(|v| v.to_string()).unwrap_or_default(),
                row.calculation_date.to_rfc3339(),
            ])?;
        }
        writer.flush()?;

        log::info!(
            "📊 Generated KPI summary CSV ({} rows): {}",
            report.kpi_results.len(),
            path.display()
        );
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trend::TrendReading;
    use crate::model::{DateWindow, KpiName, KpiResult};
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    fn report_with_rows(rows: Vec<KpiResult>) -> RunReport {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        RunReport {
            generated_at: Utc::now(),
            window: DateWindow::new(date, date),
            kpi_results: rows,
            validation: vec![],
            revenue_outliers: vec![],
            monthly_trend: TrendReading::Indeterminate,
            insights: vec![],
            regions: vec![],
        }
    }

    #[tokio::test]
    async fn test_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSummarySink::new(dir.path());

        let row = KpiResult {
            kpi_name: KpiName::TopCustomers,
            kpi_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            kpi_value: 4200.0,
            region_id: None,
            entity_id: Some(7),
            calculation_date: Utc::now(),
        };
        sink.write_report(&report_with_rows(vec![row])).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);

        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert!(content.starts_with("KPI_NAME,KPI_DATE,KPI_VALUE,REGION_ID,ENTITY_ID,CALCULATION_DATE"));
        assert!(content.contains("TOP_CUSTOMERS,2024-01-10,4200,,7,"));
    }

    #[tokio::test]
    async fn test_empty_report_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSummarySink::new(dir.path());

        sink.write_report(&report_with_rows(vec![])).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
