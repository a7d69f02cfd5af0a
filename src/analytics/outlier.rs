//! Outlier detection over a KPI series with configurable thresholds

use chrono::NaiveDate;
use serde::Serialize;

/// One flagged point in a KPI series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierPoint {
    pub bucket_date: NaiveDate,
    pub value: f64,
    pub z_score: f64,
    pub deviation_percent: f64,
}

pub struct OutlierDetector {
    threshold_percent: f64,
    zscore_threshold: f64,
}

impl OutlierDetector {
    pub fn new(threshold_percent: f64, zscore_threshold: f64) -> Self {
        Self {
            threshold_percent,
            zscore_threshold,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(20.0, 2.5)
    }

    /// Flag points deviating from the series mean by more than
    /// `threshold_percent` percent of the mean
    ///
    /// The mean is taken over the full supplied series; the tested point is
    /// not excluded. Series of length 0 or 1 produce no outliers.
    pub fn detect_percent(&self, series: &[(NaiveDate, f64)]) -> Vec<OutlierPoint> {
        if series.len() < 2 {
            return Vec::new();
        }

        let mean = mean(series);
        let stddev = population_stddev(series, mean);
        let threshold = mean * (self.threshold_percent / 100.0);

        series
            .iter()
            .filter(|(_, value)| (value - mean).abs() > threshold)
            .map(|&(date, value)| flagged(date, value, mean, stddev))
            .collect()
    }

    /// Z-score variant for generic daily aggregates
    ///
    /// Flags `|value - mean| / stddev > threshold` using the population
    /// standard deviation. Fewer than 3 points is insufficient data to
    /// estimate spread; a constant series (stddev 0) flags nothing.
    pub fn detect_zscore(&self, series: &[(NaiveDate, f64)]) -> Vec<OutlierPoint> {
        if series.len() < 3 {
            return Vec::new();
        }

        let mean = mean(series);
        let stddev = population_stddev(series, mean);
        if stddev == 0.0 {
            return Vec::new();
        }

        series
            .iter()
            .filter(|(_, value)| ((value - mean) / stddev).abs() > self.zscore_threshold)
            .map(|&(date, value)| flagged(date, value, mean, stddev))
            .collect()
    }
}

fn flagged(date: NaiveDate, value: f64, mean: f64, stddev: f64) -> OutlierPoint {
    OutlierPoint {
        bucket_date: date,
        value,
        z_score: if stddev == 0.0 { 0.0 } else { (value - mean) / stddev },
        deviation_percent: if mean == 0.0 {
            0.0
        } else {
            (value - mean) / mean * 100.0
        },
    }
}

fn mean(series: &[(NaiveDate, f64)]) -> f64 {
    series.iter().map(|(_, v)| v).sum::<f64>() / series.len() as f64
}

fn population_stddev(series: &[(NaiveDate, f64)], mean: f64) -> f64 {
    let variance = series
        .iter()
        .map(|(_, v)| (v - mean).powi(2))
        .sum::<f64>()
        / series.len() as f64;
    variance.sqrt()
}
