use core_types::PriceSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean and population standard deviation of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    pub average: f64,
    pub standard_deviation: f64,
}

/// Everything known about a single ticker over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSummary {
    pub ticker: String,
    pub average: f64,
    pub standard_deviation: f64,
    pub price_history: PriceSeries,
}

/// One side of a [`CorrelationReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerStats {
    pub average_price: f64,
    pub standard_deviation: f64,
    pub price_history: PriceSeries,
}

/// Correlation between two tickers plus the stats of each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationReport {
    pub ticker1: String,
    pub ticker2: String,
    pub correlation: f64,
    /// Keyed by ticker. Holds a single entry when both tickers are the same.
    pub stocks: BTreeMap<String, TickerStats>,
}

/// Pairwise correlations for a set of tickers.
///
/// `matrix[i][j]` is the correlation of `tickers[i]` with `tickers[j]`. The
/// diagonal is `1.0`; a pair whose series could not be correlated is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == row)?;
        let j = self.tickers.iter().position(|t| t == col)?;
        self.matrix[i][j]
    }
}
