use crate::error::ApiError;
use crate::session::Session;
use crate::transport::{RemoteRequest, RemoteResponse, Transport};
use async_trait::async_trait;
use core_types::{PriceSample, PriceSeries, Token};
use serde_json::Value;
use std::sync::Arc;

/// Read access to price data. Implemented by [`PriceFetcher`]; the facade
/// depends on this trait only.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches a ticker's price history over the trailing `minutes`. (Authenticated)
    async fn fetch_history(&self, ticker: &str, minutes: u64) -> Result<PriceSeries, ApiError>;

    /// Fetches the list of known tickers. (Authenticated)
    async fn fetch_all_tickers(&self) -> Result<Vec<String>, ApiError>;
}

/// Issues authenticated reads against the price service and validates the
/// shape of what comes back. It never retries and never re-authenticates.
#[derive(Clone)]
pub struct PriceFetcher {
    transport: Arc<dyn Transport>,
    session: Session,
}

impl PriceFetcher {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self { transport, session }
    }

    async fn require_token(&self) -> Result<Token, ApiError> {
        self.session.token().await.ok_or(ApiError::Unauthenticated)
    }

    /// Sends an authenticated GET and returns the parsed JSON body of a 2xx answer.
    async fn get_json(&self, request: RemoteRequest) -> Result<Value, ApiError> {
        let token = self.require_token().await?;
        let response = self.transport.send(request.with_bearer(token)).await?;
        let body = check_status(response)?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("body is not valid JSON: {e}")))
    }
}

fn check_status(response: RemoteResponse) -> Result<String, ApiError> {
    match response.status {
        401 => {
            tracing::warn!("Price service rejected the bearer token.");
            Err(ApiError::TokenExpired)
        }
        _ if response.is_success() => Ok(response.body),
        status => Err(ApiError::Remote {
            status,
            body: response.body,
        }),
    }
}

/// Checks that `value` is an array of `{price, timestamp}` objects.
fn parse_history(value: Value) -> Result<PriceSeries, ApiError> {
    let Value::Array(items) = value else {
        return Err(ApiError::InvalidResponse(
            "expected array of price data".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let price = item.get("price").filter(|v| !v.is_null());
            let timestamp = item.get("timestamp").filter(|v| !v.is_null());
            let (Some(price), Some(timestamp)) = (price, timestamp) else {
                return Err(ApiError::InvalidResponse(format!(
                    "invalid price data at index {index}: missing price or timestamp"
                )));
            };
            let price = price.as_f64().ok_or_else(|| {
                ApiError::InvalidResponse(format!(
                    "invalid price data at index {index}: price is not a number"
                ))
            })?;
            let timestamp = timestamp.as_str().ok_or_else(|| {
                ApiError::InvalidResponse(format!(
                    "invalid price data at index {index}: timestamp is not a string"
                ))
            })?;
            Ok(PriceSample::new(price, timestamp))
        })
        .collect()
}

fn parse_tickers(value: Value) -> Result<Vec<String>, ApiError> {
    let Value::Array(items) = value else {
        return Err(ApiError::InvalidResponse(
            "expected array of stock tickers".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(ticker) => Ok(ticker),
            _ => Err(ApiError::InvalidResponse(format!(
                "ticker at index {index} is not a string"
            ))),
        })
        .collect()
}

#[async_trait]
impl PriceSource for PriceFetcher {
    async fn fetch_history(&self, ticker: &str, minutes: u64) -> Result<PriceSeries, ApiError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ApiError::InvalidArgument("invalid ticker symbol".to_string()));
        }
        if minutes == 0 {
            return Err(ApiError::InvalidArgument(
                "minutes must be a positive number".to_string(),
            ));
        }

        let request = RemoteRequest::get(&["stocks", ticker, "history"]).with_query("minutes", minutes);
        let series = parse_history(self.get_json(request).await?)?;
        tracing::debug!(ticker, minutes, samples = series.len(), "Fetched price history.");
        Ok(series)
    }

    async fn fetch_all_tickers(&self) -> Result<Vec<String>, ApiError> {
        let tickers = parse_tickers(self.get_json(RemoteRequest::get(&["stocks"])).await?)?;
        tracing::debug!(count = tickers.len(), "Fetched ticker list.");
        Ok(tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, ScriptedTransport};

    const HISTORY: &str = "/stocks/NVDA/history";

    async fn fetcher_with_token() -> (Arc<ScriptedTransport>, PriceFetcher) {
        let transport = Arc::new(ScriptedTransport::new());
        let session = Session::new();
        session.store_token(Token::new("tok-1")).await;
        (transport.clone(), PriceFetcher::new(transport, session))
    }

    #[tokio::test]
    async fn fetch_without_token_makes_no_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let fetcher = PriceFetcher::new(transport.clone(), Session::new());

        assert!(matches!(
            fetcher.fetch_history("NVDA", 30).await,
            Err(ApiError::Unauthenticated)
        ));
        assert!(matches!(
            fetcher.fetch_all_tickers().await,
            Err(ApiError::Unauthenticated)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_arguments_before_sending() {
        let (transport, fetcher) = fetcher_with_token().await;

        assert!(matches!(
            fetcher.fetch_history("  ", 30).await,
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            fetcher.fetch_history("NVDA", 0).await,
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn fetch_history_sends_token_and_window() {
        let (transport, fetcher) = fetcher_with_token().await;
        transport.respond(
            Method::Get,
            HISTORY,
            200,
            r#"[{"price":231.95,"timestamp":"2025-05-08T04:26:27.46Z"},
                {"price":124,"timestamp":"2025-05-08T04:30:23.46Z"}]"#,
        );

        let series = fetcher.fetch_history("NVDA", 50).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0], PriceSample::new(231.95, "2025-05-08T04:26:27.46Z"));
        assert_eq!(series[1].price, 124.0);

        let sent = &transport.requests()[0];
        assert_eq!(sent.bearer, Some(Token::new("tok-1")));
        assert_eq!(sent.query, vec![("minutes".to_string(), "50".to_string())]);
    }

    #[tokio::test]
    async fn empty_history_is_valid() {
        let (transport, fetcher) = fetcher_with_token().await;
        transport.respond(Method::Get, HISTORY, 200, "[]");

        assert!(fetcher.fetch_history("NVDA", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_token_expired_without_retry() {
        let (transport, fetcher) = fetcher_with_token().await;
        transport.respond(Method::Get, HISTORY, 401, "");

        assert!(matches!(
            fetcher.fetch_history("NVDA", 30).await,
            Err(ApiError::TokenExpired)
        ));
        assert_eq!(transport.count(Method::Get, HISTORY), 1);
    }

    #[tokio::test]
    async fn other_failures_carry_status_and_body() {
        let (transport, fetcher) = fetcher_with_token().await;
        transport.respond(Method::Get, HISTORY, 503, "maintenance");

        match fetcher.fetch_history("NVDA", 30).await {
            Err(ApiError::Remote { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_history_shapes_cite_the_index() {
        let (transport, fetcher) = fetcher_with_token().await;
        transport
            .respond(Method::Get, HISTORY, 200, r#"{"price":1}"#)
            .respond(
                Method::Get,
                HISTORY,
                200,
                r#"[{"price":1,"timestamp":"t0"},{"price":2}]"#,
            )
            .respond(
                Method::Get,
                HISTORY,
                200,
                r#"[{"price":1,"timestamp":"t0"},{"price":2,"timestamp":"t1"},{"price":"abc","timestamp":"t2"}]"#,
            )
            .respond(Method::Get, HISTORY, 200, "not json");

        let messages: Vec<String> = {
            let mut out = Vec::new();
            for _ in 0..4 {
                match fetcher.fetch_history("NVDA", 30).await {
                    Err(ApiError::InvalidResponse(msg)) => out.push(msg),
                    other => panic!("unexpected result: {other:?}"),
                }
            }
            out
        };

        assert!(messages[0].contains("expected array"));
        assert!(messages[1].contains("index 1"));
        assert!(messages[2].contains("index 2"));
        assert!(messages[3].contains("not valid JSON"));
    }

    #[tokio::test]
    async fn fetch_all_tickers_validates_strings() {
        let (transport, fetcher) = fetcher_with_token().await;
        transport
            .respond(Method::Get, "/stocks", 200, r#"["AAPL","NVDA"]"#)
            .respond(Method::Get, "/stocks", 200, r#"["AAPL",7]"#);

        assert_eq!(fetcher.fetch_all_tickers().await.unwrap(), vec!["AAPL", "NVDA"]);
        assert!(matches!(
            fetcher.fetch_all_tickers().await,
            Err(ApiError::InvalidResponse(ref m)) if m.contains("index 1")
        ));
    }
}
