//! KPI aggregation over a windowed transaction set
//!
//! Pure computation: the aggregator takes transactions already filtered to
//! the date window and never touches the store. Each family is computed
//! independently so the orchestrator can commit one transaction per family.
//! All sums use compensated summation to keep large batches stable.

use crate::model::{month_bucket, DateWindow, KpiName, KpiResult, Transaction};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Compensated (Kahan) accumulator for f64 sums
#[derive(Debug, Clone, Copy, Default)]
struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum
    }
}

pub struct KpiAggregator {
    top_n: usize,
}

impl KpiAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn with_defaults() -> Self {
        Self::new(10)
    }

    /// Compute one KPI family over the transaction set
    ///
    /// Empty input yields zero rows, never an error. Transactions with a
    /// null region are excluded from REVENUE_BY_REGION only.
    pub fn compute_family(
        &self,
        family: KpiName,
        transactions: &[Transaction],
        window: DateWindow,
        calculated_at: DateTime<Utc>,
    ) -> Vec<KpiResult> {
        match family {
            KpiName::RevenueByRegion => revenue_by_region(transactions, calculated_at),
            KpiName::MonthlyRevenueTrend => monthly_revenue_trend(transactions, calculated_at),
            KpiName::TopCustomers => {
                top_customers(transactions, self.top_n, window.end, calculated_at)
            }
            KpiName::AvgTransactionValue => avg_transaction_value(transactions, calculated_at),
            KpiName::ProductPerformance => {
                product_performance(transactions, window.end, calculated_at)
            }
        }
    }

    /// Compute every family in canonical order
    pub fn compute_all(
        &self,
        transactions: &[Transaction],
        window: DateWindow,
        calculated_at: DateTime<Utc>,
    ) -> Vec<KpiResult> {
        KpiName::all()
            .into_iter()
            .flat_map(|family| self.compute_family(family, transactions, window, calculated_at))
            .collect()
    }
}

impl Default for KpiAggregator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Sum of total_amount per (region, day); null-region rows are excluded
fn revenue_by_region(transactions: &[Transaction], calculated_at: DateTime<Utc>) -> Vec<KpiResult> {
    let mut buckets: BTreeMap<(i64, NaiveDate), KahanSum> = BTreeMap::new();

    for t in transactions {
        if let Some(region_id) = t.region_id {
            buckets
                .entry((region_id, t.transaction_date))
                .or_default()
                .add(t.total_amount);
        }
    }

    buckets
        .into_iter()
        .map(|((region_id, date), sum)| KpiResult {
            kpi_name: KpiName::RevenueByRegion,
            kpi_date: date,
            kpi_value: sum.value(),
            region_id: Some(region_id),
            entity_id: None,
            calculation_date: calculated_at,
        })
        .collect()
}

/// Sum of total_amount per calendar month, keyed on the first of the month
fn monthly_revenue_trend(
    transactions: &[Transaction],
    calculated_at: DateTime<Utc>,
) -> Vec<KpiResult> {
    let mut buckets: BTreeMap<NaiveDate, KahanSum> = BTreeMap::new();

    for t in transactions {
        buckets
            .entry(month_bucket(t.transaction_date))
            .or_default()
            .add(t.total_amount);
    }

    buckets
        .into_iter()
        .map(|(month, sum)| KpiResult {
            kpi_name: KpiName::MonthlyRevenueTrend,
            kpi_date: month,
            kpi_value: sum.value(),
            region_id: None,
            entity_id: None,
            calculation_date: calculated_at,
        })
        .collect()
}

/// N largest customers by summed revenue, ties broken by ascending id
fn top_customers(
    transactions: &[Transaction],
    top_n: usize,
    as_of: NaiveDate,
    calculated_at: DateTime<Utc>,
) -> Vec<KpiResult> {
    let mut by_customer: BTreeMap<i64, KahanSum> = BTreeMap::new();
    for t in transactions {
        by_customer.entry(t.customer_id).or_default().add(t.total_amount);
    }

    let mut ranked: Vec<(i64, f64)> = by_customer
        .into_iter()
        .map(|(id, sum)| (id, sum.value()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(top_n);

    ranked
        .into_iter()
        .map(|(customer_id, revenue)| KpiResult {
            kpi_name: KpiName::TopCustomers,
            kpi_date: as_of,
            kpi_value: revenue,
            region_id: None,
            entity_id: Some(customer_id),
            calculation_date: calculated_at,
        })
        .collect()
}

/// Mean of total_amount per day
fn avg_transaction_value(
    transactions: &[Transaction],
    calculated_at: DateTime<Utc>,
) -> Vec<KpiResult> {
    let mut buckets: BTreeMap<NaiveDate, (KahanSum, usize)> = BTreeMap::new();

    for t in transactions {
        let entry = buckets.entry(t.transaction_date).or_default();
        entry.0.add(t.total_amount);
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| KpiResult {
            kpi_name: KpiName::AvgTransactionValue,
            kpi_date: date,
            kpi_value: sum.value() / count as f64,
            region_id: None,
            entity_id: None,
            calculation_date: calculated_at,
        })
        .collect()
}

/// Sum of total_amount per product, descending; ties by ascending id
fn product_performance(
    transactions: &[Transaction],
    as_of: NaiveDate,
    calculated_at: DateTime<Utc>,
) -> Vec<KpiResult> {
    let mut by_product: BTreeMap<i64, KahanSum> = BTreeMap::new();
    for t in transactions {
        by_product.entry(t.product_id).or_default().add(t.total_amount);
    }

    let mut ranked: Vec<(i64, f64)> = by_product
        .into_iter()
        .map(|(id, sum)| (id, sum.value()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .map(|(product_id, revenue)| KpiResult {
            kpi_name: KpiName::ProductPerformance,
            kpi_date: as_of,
            kpi_value: revenue,
            region_id: None,
            entity_id: Some(product_id),
            calculation_date: calculated_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    fn make_transaction(
        date: &str,
        customer_id: i64,
        product_id: i64,
        region_id: Option<i64>,
        total: f64,
    ) -> Transaction {
        Transaction {
            id: None,
            transaction_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            customer_id,
            product_id,
            quantity: 1.0,
            unit_price: total,
            total_amount: total,
            region_id,
            discount_percentage: 0.0,
        }
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        let agg = KpiAggregator::with_defaults();
        let rows = agg.compute_all(&[], window(), Utc::now());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_revenue_by_region_excludes_null_region() {
        let agg = KpiAggregator::with_defaults();
        let txs = vec![
            make_transaction("2024-01-10", 1, 101, Some(1), 100.0),
            make_transaction("2024-01-10", 2, 101, Some(1), 50.0),
            make_transaction("2024-01-10", 3, 101, None, 999.0),
        ];

        let rows = agg.compute_family(KpiName::RevenueByRegion, &txs, window(), Utc::now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region_id, Some(1));
        assert_eq!(rows[0].kpi_value, 150.0);

        // Null-region row still counts everywhere else
        let monthly = agg.compute_family(KpiName::MonthlyRevenueTrend, &txs, window(), Utc::now());
        assert_eq!(monthly[0].kpi_value, 1149.0);
    }

    #[test]
    fn test_partition_property() {
        // Per-region sums + null-region remainder == per-day sums == grand total
        let agg = KpiAggregator::with_defaults();
        let txs = vec![
            make_transaction("2024-01-10", 1, 101, Some(1), 100.0),
            make_transaction("2024-01-10", 2, 102, Some(2), 75.0),
            make_transaction("2024-01-11", 1, 101, Some(1), 25.0),
            make_transaction("2024-01-12", 3, 103, None, 40.0),
            make_transaction("2024-02-01", 4, 101, Some(2), 60.0),
        ];
        let grand_total: f64 = txs.iter().map(|t| t.total_amount).sum();

        let by_region: f64 = agg
            .compute_family(KpiName::RevenueByRegion, &txs, window(), Utc::now())
            .iter()
            .map(|r| r.kpi_value)
            .sum();
        let null_region: f64 = txs
            .iter()
            .filter(|t| t.region_id.is_none())
            .map(|t| t.total_amount)
            .sum();
        assert!((by_region + null_region - grand_total).abs() < 1e-9);

        let by_month: f64 = agg
            .compute_family(KpiName::MonthlyRevenueTrend, &txs, window(), Utc::now())
            .iter()
            .map(|r| r.kpi_value)
            .sum();
        assert!((by_month - grand_total).abs() < 1e-9);
    }

    #[test]
    fn test_top_customers_order_and_ties() {
        let agg = KpiAggregator::new(3);
        let txs = vec![
            make_transaction("2024-01-10", 5, 101, Some(1), 100.0),
            make_transaction("2024-01-10", 2, 101, Some(1), 100.0),
            make_transaction("2024-01-10", 9, 101, Some(1), 300.0),
            make_transaction("2024-01-10", 7, 101, Some(1), 50.0),
        ];

        let rows = agg.compute_family(KpiName::TopCustomers, &txs, window(), Utc::now());
        assert_eq!(rows.len(), 3);
        // 9 first (300), then the 100.0 tie broken by ascending customer id
        assert_eq!(rows[0].entity_id, Some(9));
        assert_eq!(rows[1].entity_id, Some(2));
        assert_eq!(rows[2].entity_id, Some(5));
        assert_eq!(rows[0].kpi_date, window().end);
    }

    #[test]
    fn test_top_n_larger_than_distinct_customers() {
        let agg = KpiAggregator::new(10);
        let txs = vec![
            make_transaction("2024-01-10", 1, 101, Some(1), 10.0),
            make_transaction("2024-01-10", 2, 101, Some(1), 20.0),
        ];

        let rows = agg.compute_family(KpiName::TopCustomers, &txs, window(), Utc::now());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_avg_transaction_value_per_day() {
        let agg = KpiAggregator::with_defaults();
        let txs = vec![
            make_transaction("2024-01-10", 1, 101, Some(1), 100.0),
            make_transaction("2024-01-10", 2, 101, Some(1), 200.0),
            make_transaction("2024-01-11", 1, 101, Some(1), 60.0),
        ];

        let rows = agg.compute_family(KpiName::AvgTransactionValue, &txs, window(), Utc::now());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kpi_value, 150.0);
        assert_eq!(rows[1].kpi_value, 60.0);
    }

    #[test]
    fn test_product_performance_descending() {
        let agg = KpiAggregator::with_defaults();
        let txs = vec![
            make_transaction("2024-01-10", 1, 103, Some(1), 10.0),
            make_transaction("2024-01-10", 1, 101, Some(1), 500.0),
            make_transaction("2024-01-11", 2, 103, Some(1), 30.0),
        ];

        let rows = agg.compute_family(KpiName::ProductPerformance, &txs, window(), Utc::now());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_id, Some(101));
        assert_eq!(rows[0].kpi_value, 500.0);
        assert_eq!(rows[1].entity_id, Some(103));
        assert_eq!(rows[1].kpi_value, 40.0);
    }

    #[test]
    fn test_kahan_sum_stability() {
        let mut kahan = KahanSum::default();
        for _ in 0..1_000_000 {
            kahan.add(0.1);
        }
        assert!((kahan.value() - 100_000.0).abs() < 1e-6);
    }
}
