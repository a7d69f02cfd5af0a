//! Banner-formatted text summary report

use super::{ReportError, ReportSink, RunReport};
use crate::model::KpiName;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct TextReportSink {
    output_dir: PathBuf,
}

impl TextReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn render(report: &RunReport) -> String {
        let mut lines = Vec::new();
        let banner = "=".repeat(80);

        lines.push(banner.clone());
        lines.push("ENTERPRISE SALES ANALYTICS REPORT".to_string());
        lines.push(banner.clone());
        lines.push(format!(
            "Generated on: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(format!(
            "Window: {} to {}",
            report.window.start, report.window.end
        ));
        lines.push(String::new());

        let total_revenue: f64 = report
            .kpi_results
            .iter()
            .filter(|r| r.kpi_name == KpiName::MonthlyRevenueTrend)
            .map(|r| r.kpi_value)
            .sum();
        lines.push(format!("Total Revenue: ${:.2}", total_revenue));

        // Revenue by region, summed over the window, largest first
        let mut by_region: BTreeMap<i64, f64> = BTreeMap::new();
        for row in report
            .kpi_results
            .iter()
            .filter(|r| r.kpi_name == KpiName::RevenueByRegion)
        {
            if let Some(region_id) = row.region_id {
                *by_region.entry(region_id).or_insert(0.0) += row.kpi_value;
            }
        }
        if !by_region.is_empty() {
            lines.push(String::new());
            lines.push("Revenue by Region:".to_string());
            lines.push("-".repeat(40));

            let mut ranked: Vec<(i64, f64)> = by_region.into_iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            for (region_id, revenue) in ranked {
                let name = report
                    .regions
                    .iter()
                    .find(|r| r.region_id == region_id)
                    .map(|r| r.region_name.clone())
                    .unwrap_or_else(|| format!("Region {}", region_id));
                lines.push(format!("  {}: ${:.2}", name, revenue));
            }
        }

        let avg_rows: Vec<f64> = report
            .kpi_results
            .iter()
            .filter(|r| r.kpi_name == KpiName::AvgTransactionValue)
            .map(|r| r.kpi_value)
            .collect();
        if !avg_rows.is_empty() {
            let avg = avg_rows.iter().sum::<f64>() / avg_rows.len() as f64;
            lines.push(String::new());
            lines.push(format!("Average Transaction Value: ${:.2}", avg));
        }

        lines.push(String::new());
        lines.push(banner.clone());
        lines.push("VALIDATION".to_string());
        lines.push(banner.clone());
        for outcome in &report.validation {
            lines.push(format!(
                "  [{}] {}: {} checked, {} passed, {} failed {}",
                outcome.status.as_str(),
                outcome.check_name,
                outcome.records_checked,
                outcome.records_passed,
                outcome.records_failed,
                outcome.detail,
            ));
        }

        lines.push(String::new());
        lines.push(banner.clone());
        lines.push("INSIGHTS".to_string());
        lines.push(banner);
        for insight in &report.insights {
            lines.push(insight.clone());
        }

        lines.join("\n")
    }
}

#[async_trait]
impl ReportSink for TextReportSink {
    async fn write_report(&mut self, report: &RunReport) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let filename = format!("report_{}.txt", report.generated_at.format("%Y%m%d_%H%M%S"));
        let path = self.output_dir.join(filename);
        std::fs::write(&path, Self::render(report))?;

        log::info!("📝 Generated text report: {}", path.display());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "Text"
    }
}
