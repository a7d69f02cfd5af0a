//! Rule-based narrative insights over durable KPI data

use super::outlier::{OutlierDetector, OutlierPoint};
use super::trend::{TrendClassifier, TrendReading};
use crate::model::KpiName;
use crate::store::{RecordStore, StoreError};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Structured insight output plus the narrative lines for the report
#[derive(Debug, Clone)]
pub struct InsightBundle {
    pub revenue_outliers: Vec<OutlierPoint>,
    pub monthly_trend: TrendReading,
    pub lines: Vec<String>,
}

pub struct InsightGenerator {
    store: Arc<dyn RecordStore>,
    detector: OutlierDetector,
    classifier: TrendClassifier,
}

impl InsightGenerator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        detector: OutlierDetector,
        classifier: TrendClassifier,
    ) -> Self {
        Self {
            store,
            detector,
            classifier,
        }
    }

    /// Generate summary insights from the KPI history in the store
    pub async fn generate_summary(&self) -> Result<InsightBundle, StoreError> {
        let mut lines = Vec::new();

        // Revenue-by-region outliers over the full history
        let region_series: Vec<_> = self
            .store
            .fetch_kpi_results(KpiName::RevenueByRegion, None)
            .await?
            .iter()
            .map(|r| (r.kpi_date, r.kpi_value))
            .collect();
        let revenue_outliers = self.detector.detect_percent(&region_series);
        if !revenue_outliers.is_empty() {
            lines.push(format!(
                "⚠️ Found {} revenue outliers by region",
                revenue_outliers.len()
            ));
        }

        // Monthly revenue trend
        let monthly_values: Vec<f64> = self
            .store
            .fetch_kpi_results(KpiName::MonthlyRevenueTrend, None)
            .await?
            .iter()
            .map(|r| r.kpi_value)
            .collect();
        let monthly_trend = self.classifier.classify(&monthly_values);
        lines.push(format!("📈 Monthly Revenue: {}", monthly_trend.describe()));

        // Top-customer availability over the last week
        let week_ago = Utc::now().date_naive() - Duration::days(7);
        let recent_top = self
            .store
            .fetch_kpi_results(KpiName::TopCustomers, None)
            .await?
            .iter()
            .filter(|r| r.calculation_date.date_naive() >= week_ago)
            .count();
        if recent_top > 0 {
            lines.push("👥 Top customers analysis available for last 7 days".to_string());
        }

        if lines.is_empty() {
            lines.push("No significant insights detected".to_string());
        }

        log::info!("💡 Generated {} insight lines", lines.len());

        Ok(InsightBundle {
            revenue_outliers,
            monthly_trend,
            lines,
        })
    }
}
