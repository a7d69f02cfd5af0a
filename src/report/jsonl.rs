//! JSONL sink - one JSON object per KPI row, append-only

use super::{ReportError, ReportSink, RunReport};
use crate::model::KpiResult;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub struct JsonlReportSink {
    path: PathBuf,
    writer: Option<BufWriter<std::fs::File>>,
}

impl JsonlReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: output_dir.into().join("kpi_results.jsonl"),
            writer: None,
        }
    }

    fn writer(&mut self) -> std::io::Result<&mut BufWriter<std::fs::File>> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            log::info!("📝 Appending KPI rows to: {}", self.path.display());
            self.writer = Some(BufWriter::new(file));
        }
        Ok(self.writer.as_mut().unwrap())
    }

    fn write_rows(&mut self, rows: &[KpiResult]) -> Result<(), ReportError> {
        let lines: Vec<String> = rows
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<_, _>>()?;

        let writer = self.writer()?;
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlReportSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

#[async_trait]
impl ReportSink for JsonlReportSink {
    async fn write_report(&mut self, report: &RunReport) -> Result<(), ReportError> {
        self.write_rows(&report.kpi_results)?;
        log::debug!("✅ Appended {} KPI rows as JSONL", report.kpi_results.len());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trend::TrendReading;
    use crate::model::{DateWindow, KpiName};
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    fn report_with_one_row() -> RunReport {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        RunReport {
            generated_at: Utc::now(),
            window: DateWindow::new(date, date),
            kpi_results: vec![KpiResult {
                kpi_name: KpiName::RevenueByRegion,
                kpi_date: date,
                kpi_value: 150.5,
                region_id: Some(2),
                entity_id: None,
                calculation_date: Utc::now(),
            }],
            validation: vec![],
            revenue_outliers: vec![],
            monthly_trend: TrendReading::Indeterminate,
            insights: vec![],
            regions: vec![],
        }
    }

    #[tokio::test]
    async fn test_appends_parseable_json_lines() {
        let dir = tempdir().unwrap();
        let mut sink = JsonlReportSink::new(dir.path());

        sink.write_report(&report_with_one_row()).await.unwrap();
        sink.write_report(&report_with_one_row()).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("kpi_results.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["kpi_name"], "REVENUE_BY_REGION");
        assert_eq!(parsed["kpi_value"], 150.5);
        assert_eq!(parsed["region_id"], 2);
    }
}
