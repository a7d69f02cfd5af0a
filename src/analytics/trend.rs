//! Trend classification over the most recent periods of a KPI series

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    /// Last equals first: no clear trend
    Flat,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Flat => "no clear trend",
        }
    }
}

/// Classification result - insufficient data and a zero first value are
/// reported as variants, never as errors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TrendReading {
    InsufficientData {
        available: usize,
        required: usize,
    },
    /// First value is zero; percent change is undefined
    Indeterminate,
    Move {
        direction: TrendDirection,
        percent_change: f64,
        periods: usize,
    },
}

impl TrendReading {
    pub fn describe(&self) -> String {
        match self {
            TrendReading::InsufficientData { available, required } => format!(
                "Insufficient data for trend analysis ({} of {} periods available)",
                available, required
            ),
            TrendReading::Indeterminate => {
                "Trend indeterminate (first period value is zero)".to_string()
            }
            TrendReading::Move {
                direction,
                percent_change,
                periods,
            } => format!(
                "Trend: {} ({:.2}% change over {} periods)",
                direction.as_str(),
                percent_change,
                periods
            ),
        }
    }
}

pub struct TrendClassifier {
    periods: usize,
}

impl TrendClassifier {
    pub fn new(periods: usize) -> Self {
        Self { periods }
    }

    pub fn with_defaults() -> Self {
        Self::new(3)
    }

    /// Classify the `periods` most recent values of a series sorted
    /// ascending by date
    ///
    /// Compares the first and last of those values: strictly greater is
    /// increasing, strictly less is decreasing, equal is flat. Fewer than
    /// `periods` points never computes on a short window.
    pub fn classify(&self, values: &[f64]) -> TrendReading {
        if values.len() < self.periods || self.periods < 2 {
            return TrendReading::InsufficientData {
                available: values.len(),
                required: self.periods,
            };
        }

        let recent = &values[values.len() - self.periods..];
        let first = recent[0];
        let last = recent[self.periods - 1];

        if first == 0.0 {
            return TrendReading::Indeterminate;
        }

        let direction = if last > first {
            TrendDirection::Increasing
        } else if last < first {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Flat
        };

        TrendReading::Move {
            direction,
            percent_change: (last - first) / first * 100.0,
            periods: self.periods,
        }
    }
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}
