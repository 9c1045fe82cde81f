use super::*;
use api_client::{Method, ScriptedTransport};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use core_types::Credentials;
use serde_json::Value;
use tower::ServiceExt;

fn history(prices: &[f64]) -> String {
    let items: Vec<String> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| format!(r#"{{"price":{p},"timestamp":"2025-05-08T04:{i:02}:00Z"}}"#))
        .collect();
    format!("[{}]", items.join(","))
}

fn app(transport: &Arc<ScriptedTransport>, credentials: Option<Credentials>) -> Router {
    let session = match credentials {
        Some(c) => Session::with_credentials(c),
        None => Session::new(),
    };
    let service = AnalyticsService::from_client(StockClient::new(transport.clone(), session), true);
    build_router(Arc::new(AppState { service }))
}

fn authed_app(transport: &Arc<ScriptedTransport>) -> Router {
    transport.respond(Method::Post, "/auth", 200, r#"{"token":"tok-1"}"#);
    app(transport, Some(Credentials::new("id", "secret")))
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_needs_no_token() {
    let transport = Arc::new(ScriptedTransport::new());
    let response = app(&transport, None)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn average_authenticates_lazily_and_answers() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);
    transport.respond(
        Method::Get,
        "/stocks/NVDA/history",
        200,
        history(&[10.0, 20.0]),
    );

    let (status, body) = call(app, "/average?ticker=NVDA&minutes=30").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["ticker"], "NVDA");
    assert_eq!(body["average"], 15.0);
    assert_eq!(transport.count(Method::Post, "/auth"), 1);
}

#[tokio::test]
async fn missing_credentials_are_unauthorized() {
    let transport = Arc::new(ScriptedTransport::new());

    let (status, body) = call(app(&transport, None), "/stocks").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn bad_minutes_are_rejected_before_fetching() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);

    for uri in [
        "/average?ticker=NVDA",
        "/average?ticker=NVDA&minutes=abc",
        "/stocks/NVDA?minutes=0",
        "/correlationmatrix",
    ] {
        let (status, body) = call(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
    }
    assert_eq!(transport.count(Method::Get, "/stocks/NVDA/history"), 0);
}

#[tokio::test]
async fn stock_correlation_needs_exactly_two_tickers() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);

    let (status, body) = call(app, "/stockcorrelation?ticker=AAPL&minutes=10").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Exactly two tickers must be provided");
}

#[tokio::test]
async fn stock_correlation_reports_both_tickers() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);
    transport
        .respond(Method::Get, "/stocks/AAPL/history", 200, history(&[1.0, 2.0, 3.0]))
        .respond(Method::Get, "/stocks/MSFT/history", 200, history(&[2.0, 4.0, 6.0]));

    let (status, body) = call(
        app,
        "/stockcorrelation?minutes=10&ticker=AAPL&ticker=MSFT",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let correlation = body["data"]["correlation"].as_f64().unwrap();
    assert!((correlation - 1.0).abs() < 1e-9);
    assert_eq!(body["data"]["stocks"]["AAPL"]["averagePrice"], 2.0);
    assert_eq!(
        body["data"]["stocks"]["MSFT"]["priceHistory"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn length_mismatch_is_a_bad_request() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);
    transport
        .respond(Method::Get, "/stocks/AAPL/history", 200, history(&[1.0, 2.0, 3.0]))
        .respond(Method::Get, "/stocks/MSFT/history", 200, history(&[1.0, 2.0]));

    let (status, body) = call(app, "/correlation?ticker1=AAPL&ticker2=MSFT&minutes=5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn upstream_failure_is_a_server_error() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);
    transport.respond(Method::Get, "/stocks", 503, "maintenance");

    let (status, body) = call(app, "/stocks").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn correlation_matrix_uses_requested_tickers() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);
    transport
        .respond(Method::Get, "/stocks/A/history", 200, history(&[1.0, 2.0, 3.0]))
        .respond(Method::Get, "/stocks/B/history", 200, history(&[3.0, 2.0, 1.0]));

    let (status, body) = call(app, "/correlationmatrix?minutes=5&ticker=A&ticker=B").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tickers"], serde_json::json!(["A", "B"]));
    assert_eq!(body["data"]["matrix"][0][0], 1.0);
    let off_diagonal = body["data"]["matrix"][0][1].as_f64().unwrap();
    assert!((off_diagonal + 1.0).abs() < 1e-9);
    assert_eq!(transport.count(Method::Get, "/stocks"), 0);
}

#[tokio::test]
async fn malformed_query_string_gets_the_error_envelope() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);

    let (status, body) = call(app, "/average?ticker=A&ticker=B&minutes=5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("ticker"));
    assert_eq!(transport.count(Method::Get, "/stocks/A/history"), 0);
}

#[tokio::test]
async fn reported_ticker_is_the_one_fetched() {
    let transport = Arc::new(ScriptedTransport::new());
    let app = authed_app(&transport);
    transport.respond(Method::Get, "/stocks/NVDA/history", 200, history(&[4.0, 6.0]));

    let (status, body) = call(app, "/stocks/%20NVDA?minutes=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ticker"], "NVDA");
    assert_eq!(body["data"]["average"], 5.0);
}
