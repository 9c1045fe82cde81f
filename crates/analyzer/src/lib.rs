use crate::error::AnalyzerError;
use analytics::{
    CorrelationMatrix, CorrelationReport, StatisticsEngine, TickerStats, TickerSummary,
};
use api_client::{ApiError, AuthGateway, PriceFetcher, PriceSource, StockClient};
use core_types::PriceSeries;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;

pub mod error;

/// The average price of one ticker over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageResult {
    pub ticker: String,
    pub average: f64,
}

/// The correlation of two tickers over a window, without per-ticker stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub ticker1: String,
    pub ticker2: String,
    pub correlation: f64,
}

/// Composes the price fetcher and the statistics engine. This is the only
/// component the HTTP boundary and the CLI talk to.
///
/// Every fetch runs inside a bounded re-authentication cycle: a
/// `TokenExpired` answer triggers exactly one `authenticate` and one retry of
/// the same fetch; whatever the retry yields is returned as-is.
#[derive(Clone)]
pub struct AnalyticsService<S = PriceFetcher> {
    gateway: AuthGateway,
    source: S,
    engine: StatisticsEngine,
    reauth_on_expiry: bool,
}

impl AnalyticsService<PriceFetcher> {
    pub fn from_client(client: StockClient, reauth_on_expiry: bool) -> Self {
        Self::new(client.gateway, client.fetcher, reauth_on_expiry)
    }
}

impl<S: PriceSource> AnalyticsService<S> {
    pub fn new(gateway: AuthGateway, source: S, reauth_on_expiry: bool) -> Self {
        Self {
            gateway,
            source,
            engine: StatisticsEngine::new(),
            reauth_on_expiry,
        }
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Runs `op`, re-authenticating and retrying once if the token was rejected.
    async fn with_reauth<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match op().await {
            Err(ApiError::TokenExpired) if self.reauth_on_expiry => {
                tracing::warn!("Token rejected by price service; re-authenticating once.");
                self.gateway.authenticate().await?;
                op().await
            }
            other => other,
        }
    }

    async fn fetch(&self, ticker: &str, minutes: u64) -> Result<PriceSeries, ApiError> {
        self.with_reauth(|| self.source.fetch_history(ticker, minutes))
            .await
    }

    /// Fetches both series concurrently; fails if either fetch fails.
    async fn fetch_pair(
        &self,
        first: &str,
        second: &str,
        minutes: u64,
    ) -> Result<(PriceSeries, PriceSeries), ApiError> {
        tokio::try_join!(self.fetch(first, minutes), self.fetch(second, minutes))
    }

    /// All tickers known to the price service.
    pub async fn list_tickers(&self) -> Result<Vec<String>, AnalyzerError> {
        Ok(self.with_reauth(|| self.source.fetch_all_tickers()).await?)
    }

    pub async fn get_average(&self, ticker: &str, minutes: u64) -> Result<AverageResult, AnalyzerError> {
        let ticker = ticker.trim();
        let series = self.fetch(ticker, minutes).await?;
        let average = self.engine.average(&series)?;
        Ok(AverageResult {
            ticker: ticker.to_string(),
            average,
        })
    }

    /// Average, standard deviation and the chronologically ordered history.
    pub async fn get_stock_summary(
        &self,
        ticker: &str,
        minutes: u64,
    ) -> Result<TickerSummary, AnalyzerError> {
        let ticker = ticker.trim();
        let series = self.fetch(ticker, minutes).await?;
        let stats = self.engine.summarize(&series)?;
        Ok(TickerSummary {
            ticker: ticker.to_string(),
            average: stats.average,
            standard_deviation: stats.standard_deviation,
            price_history: series.chronological(),
        })
    }

    pub async fn get_correlation(
        &self,
        first: &str,
        second: &str,
        minutes: u64,
    ) -> Result<CorrelationResult, AnalyzerError> {
        let (first, second) = (first.trim(), second.trim());
        let (a, b) = self.fetch_pair(first, second, minutes).await?;
        let correlation = self.engine.correlation(&a, &b)?;
        Ok(CorrelationResult {
            ticker1: first.to_string(),
            ticker2: second.to_string(),
            correlation,
        })
    }

    /// Correlation plus average and standard deviation of each ticker.
    /// Nothing is returned unless every step succeeds.
    pub async fn get_correlation_report(
        &self,
        first: &str,
        second: &str,
        minutes: u64,
    ) -> Result<CorrelationReport, AnalyzerError> {
        let (first, second) = (first.trim(), second.trim());
        let (a, b) = self.fetch_pair(first, second, minutes).await?;
        let correlation = self.engine.correlation(&a, &b)?;

        let mut stocks = BTreeMap::new();
        for (ticker, series) in [(first, a), (second, b)] {
            let stats = self.engine.summarize(&series)?;
            stocks.insert(
                ticker.to_string(),
                TickerStats {
                    average_price: stats.average,
                    standard_deviation: stats.standard_deviation,
                    price_history: series,
                },
            );
        }

        Ok(CorrelationReport {
            ticker1: first.to_string(),
            ticker2: second.to_string(),
            correlation,
            stocks,
        })
    }

    /// Pairwise correlations for `tickers`, or for every known ticker when empty.
    ///
    /// Each series is fetched once, concurrently. A failed fetch fails the
    /// whole call; a pair that cannot be correlated becomes an empty cell.
    pub async fn get_correlation_matrix(
        &self,
        tickers: &[String],
        minutes: u64,
    ) -> Result<CorrelationMatrix, AnalyzerError> {
        let tickers = if tickers.is_empty() {
            self.list_tickers().await?
        } else {
            dedup_preserving_order(tickers)
        };
        if tickers.is_empty() {
            return Err(AnalyzerError::InvalidArgument(
                "no tickers to correlate".to_string(),
            ));
        }

        let series = try_join_all(tickers.iter().map(|t| self.fetch(t, minutes))).await?;
        let named: Vec<(String, PriceSeries)> = tickers.into_iter().zip(series).collect();

        tracing::info!(tickers = named.len(), minutes, "Computing correlation matrix.");
        Ok(self.engine.correlation_matrix(&named))
    }
}

fn dedup_preserving_order(tickers: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        if !out.contains(ticker) {
            out.push(ticker.clone());
        }
    }
    out
}
