//! Core row types shared across the pipeline

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One sales transaction as persisted in the record store.
///
/// Rows are immutable once inserted and never deleted by this system.
/// `total_amount` is assumed (not enforced) to be
/// `quantity * unit_price * (1 - discount_percentage / 100)`; the validator
/// reports drift beyond tolerance as a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned id; None before insertion
    pub id: Option<i64>,
    pub transaction_date: NaiveDate,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub region_id: Option<i64>,
    pub discount_percentage: f64,
}

/// Region reference row (dimension data for referential checks and reports)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub region_id: i64,
    pub region_name: String,
}

/// Inclusive date window for queries and aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window ending today (UTC) and starting `days` days earlier.
    ///
    /// Both bounds are inclusive, so the window covers `days + 1` calendar
    /// days, matching a `date >= today - days` range query.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now().date_naive();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Filter for record-store transaction queries
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub window: Option<DateWindow>,
    pub region_id: Option<i64>,
}

impl TransactionFilter {
    pub fn in_window(window: DateWindow) -> Self {
        Self {
            window: Some(window),
            region_id: None,
        }
    }
}

/// The five KPI families computed by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KpiName {
    RevenueByRegion,
    MonthlyRevenueTrend,
    TopCustomers,
    AvgTransactionValue,
    ProductPerformance,
}

impl KpiName {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiName::RevenueByRegion => "REVENUE_BY_REGION",
            KpiName::MonthlyRevenueTrend => "MONTHLY_REVENUE_TREND",
            KpiName::TopCustomers => "TOP_CUSTOMERS",
            KpiName::AvgTransactionValue => "AVG_TRANSACTION_VALUE",
            KpiName::ProductPerformance => "PRODUCT_PERFORMANCE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "REVENUE_BY_REGION" => Some(KpiName::RevenueByRegion),
            "MONTHLY_REVENUE_TREND" => Some(KpiName::MonthlyRevenueTrend),
            "TOP_CUSTOMERS" => Some(KpiName::TopCustomers),
            "AVG_TRANSACTION_VALUE" => Some(KpiName::AvgTransactionValue),
            "PRODUCT_PERFORMANCE" => Some(KpiName::ProductPerformance),
            _ => None,
        }
    }

    pub fn all() -> [KpiName; 5] {
        [
            KpiName::RevenueByRegion,
            KpiName::MonthlyRevenueTrend,
            KpiName::TopCustomers,
            KpiName::AvgTransactionValue,
            KpiName::ProductPerformance,
        ]
    }
}

/// One KPI value for one date/region/entity bucket.
///
/// Append-only: re-running aggregation for an overlapping window inserts new
/// rows with a fresh `calculation_date`, it never overwrites prior rows.
/// `region_id` is set for REVENUE_BY_REGION; `entity_id` carries the
/// customer id (TOP_CUSTOMERS) or product id (PRODUCT_PERFORMANCE).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub kpi_name: KpiName,
    pub kpi_date: NaiveDate,
    pub kpi_value: f64,
    pub region_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub calculation_date: DateTime<Utc>,
}

/// Outcome status of one validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Pass,
    Warn,
    Fail,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pass => "PASS",
            ValidationStatus::Warn => "WARN",
            ValidationStatus::Fail => "FAIL",
        }
    }
}

/// Structured result of one validation check for one pipeline run.
/// Not persisted beyond the run's log and report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub check_name: String,
    pub status: ValidationStatus,
    pub records_checked: usize,
    pub records_passed: usize,
    pub records_failed: usize,
    pub detail: String,
}

impl ValidationOutcome {
    pub fn passed(check_name: &str, records_checked: usize) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: ValidationStatus::Pass,
            records_checked,
            records_passed: records_checked,
            records_failed: 0,
            detail: String::new(),
        }
    }
}

/// First calendar day of the month containing `date` (monthly bucket key)
pub fn month_bucket(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}
