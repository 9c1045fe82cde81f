use crate::error::AnalyticsError;
use crate::report::{CorrelationMatrix, SeriesStats};
use core_types::{PriceSample, PriceSeries};

/// A stateless calculator for descriptive statistics over price samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticsEngine {}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arithmetic mean of the prices. `0` for an empty series.
    pub fn average(&self, series: &[PriceSample]) -> Result<f64, AnalyticsError> {
        let prices = extract_prices(series)?;
        finite("average", mean(&prices))
    }

    /// Population standard deviation (divides by N). `0` for an empty series.
    pub fn standard_deviation(&self, series: &[PriceSample]) -> Result<f64, AnalyticsError> {
        let prices = extract_prices(series)?;
        finite("standard deviation", population_std_dev(&prices))
    }

    /// Both statistics in one pass over validation.
    pub fn summarize(&self, series: &[PriceSample]) -> Result<SeriesStats, AnalyticsError> {
        let prices = extract_prices(series)?;
        Ok(SeriesStats {
            average: finite("average", mean(&prices))?,
            standard_deviation: finite("standard deviation", population_std_dev(&prices))?,
        })
    }

    /// Pearson correlation coefficient of two series, paired by position.
    ///
    /// # Errors
    ///
    /// * `LengthMismatch` if the series differ in length (checked first).
    /// * `EmptyInput` if they are empty.
    /// * `InvalidData` if any price is not a finite number, or if the prices
    ///   are so large that the sums overflow.
    ///
    /// A constant series has no variance; the correlation is then `0`, not NaN.
    pub fn correlation(
        &self,
        first: &[PriceSample],
        second: &[PriceSample],
    ) -> Result<f64, AnalyticsError> {
        if first.len() != second.len() {
            return Err(AnalyticsError::LengthMismatch {
                left: first.len(),
                right: second.len(),
            });
        }
        if first.is_empty() {
            return Err(AnalyticsError::EmptyInput);
        }

        let x = extract_prices(first)?;
        let y = extract_prices(second)?;
        finite("correlation", pearson(&x, &y))
    }

    /// Correlates every pair of the given series.
    ///
    /// Pairs that fail a precondition (different lengths, empty, bad data)
    /// become `None` cells rather than failing the whole matrix.
    pub fn correlation_matrix(&self, series: &[(String, PriceSeries)]) -> CorrelationMatrix {
        let n = series.len();
        let mut matrix = vec![vec![None; n]; n];

        for i in 0..n {
            matrix[i][i] = Some(1.0);
            for j in (i + 1)..n {
                let cell = match self.correlation(&series[i].1, &series[j].1) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!(
                            first = %series[i].0,
                            second = %series[j].0,
                            error = %e,
                            "Pair left out of correlation matrix."
                        );
                        None
                    }
                };
                matrix[i][j] = cell;
                matrix[j][i] = cell;
            }
        }

        CorrelationMatrix {
            tickers: series.iter().map(|(ticker, _)| ticker.clone()).collect(),
            matrix,
        }
    }
}

/// Pulls the prices out, rejecting the whole series on the first non-finite one.
fn extract_prices(series: &[PriceSample]) -> Result<Vec<f64>, AnalyticsError> {
    series
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            if sample.price.is_finite() {
                Ok(sample.price)
            } else {
                Err(AnalyticsError::InvalidData(format!(
                    "non-numeric price {} at index {index}",
                    sample.price
                )))
            }
        })
        .collect()
}

/// Prices near `f64::MAX` are finite on their own but overflow once summed.
fn finite(statistic: &str, value: f64) -> Result<f64, AnalyticsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalyticsError::InvalidData(format!(
            "{statistic} overflowed to {value}"
        )))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

// Inputs are non-empty and of equal length.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }
    if !(numerator.is_finite() && sum_sq_x.is_finite() && sum_sq_y.is_finite()) {
        return f64::NAN;
    }

    // The rounded mean of a constant series can leave a residue of ~1e-17 in
    // the deviations, so constancy is checked on the values themselves too.
    if sum_sq_x == 0.0 || sum_sq_y == 0.0 || is_constant(x) || is_constant(y) {
        return 0.0;
    }

    numerator / (sum_sq_x.sqrt() * sum_sq_y.sqrt())
}
