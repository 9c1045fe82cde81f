use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const MINUTES_REQUIRED: &str = "Minutes parameter is required and must be a number";

#[derive(Debug, Deserialize)]
pub struct AverageParams {
    ticker: Option<String>,
    minutes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CorrelationParams {
    ticker1: Option<String>,
    ticker2: Option<String>,
    minutes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    minutes: Option<String>,
}

/// Query with a repeatable `ticker` key.
#[derive(Debug, Deserialize)]
pub struct MultiTickerParams {
    minutes: Option<String>,
    #[serde(default)]
    ticker: Vec<String>,
}

fn parse_minutes(raw: Option<&str>) -> Result<u64, AppError> {
    raw.map(str::trim)
        .and_then(|m| m.parse::<u64>().ok())
        .filter(|m| *m > 0)
        .ok_or_else(|| AppError::BadRequest(MINUTES_REQUIRED.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Makes sure a token is held before any data route runs.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match state.service.gateway().ensure_token().await {
        Ok(_) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Could not obtain an auth token.");
            AppError::Unauthorized("Not authenticated. Please get an auth token first.".to_string())
                .into_response()
        }
    }
}

/// # GET /
pub async fn health() -> &'static str {
    "Stock API microservice is running"
}

/// # GET /average?ticker=..&minutes=..
pub async fn get_average(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): WithRejection<Query<AverageParams>, AppError>,
) -> Result<Json<Value>, AppError> {
    let (Some(ticker), Some(minutes)) = (non_empty(params.ticker), params.minutes) else {
        return Err(AppError::BadRequest(
            "Missing required query parameters: ticker and minutes".to_string(),
        ));
    };
    let minutes = parse_minutes(Some(&minutes))?;

    let result = state.service.get_average(&ticker, minutes).await?;
    Ok(Json(json!({
        "success": true,
        "ticker": result.ticker,
        "average": result.average,
    })))
}

/// # GET /correlation?ticker1=..&ticker2=..&minutes=..
pub async fn get_correlation(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): WithRejection<Query<CorrelationParams>, AppError>,
) -> Result<Json<Value>, AppError> {
    let (Some(first), Some(second), Some(minutes)) = (
        non_empty(params.ticker1),
        non_empty(params.ticker2),
        params.minutes,
    ) else {
        return Err(AppError::BadRequest(
            "Missing required query parameters: ticker1, ticker2, and minutes".to_string(),
        ));
    };
    let minutes = parse_minutes(Some(&minutes))?;

    let result = state.service.get_correlation(&first, &second, minutes).await?;
    Ok(Json(json!({
        "success": true,
        "ticker1": result.ticker1,
        "ticker2": result.ticker2,
        "correlation": result.correlation,
    })))
}

/// # GET /stocks
pub async fn get_all_stocks(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let tickers = state.service.list_tickers().await?;
    Ok(Json(json!({ "success": true, "data": tickers })))
}

/// # GET /stocks/:ticker?minutes=..
pub async fn get_stock_history(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<WindowParams>, AppError>,
) -> Result<Json<Value>, AppError> {
    let minutes = parse_minutes(params.minutes.as_deref())?;
    let summary = state.service.get_stock_summary(&ticker, minutes).await?;
    Ok(Json(json!({ "success": true, "data": summary })))
}

/// # GET /stockcorrelation?ticker=A&ticker=B&minutes=..
pub async fn get_stock_correlation(
    State(state): State<Arc<AppState>>,
    WithRejection(axum_extra::extract::Query(params), _): WithRejection<
        axum_extra::extract::Query<MultiTickerParams>,
        AppError,
    >,
) -> Result<Json<Value>, AppError> {
    let minutes = parse_minutes(params.minutes.as_deref())?;
    let [first, second] = params.ticker.as_slice() else {
        return Err(AppError::BadRequest(
            "Exactly two tickers must be provided".to_string(),
        ));
    };

    let report = state.service.get_correlation_report(first, second, minutes).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "correlation": report.correlation,
            "stocks": report.stocks,
        },
    })))
}

/// # GET /correlationmatrix?minutes=..[&ticker=..]
/// Every known ticker is used when no `ticker` is given.
pub async fn get_correlation_matrix(
    State(state): State<Arc<AppState>>,
    WithRejection(axum_extra::extract::Query(params), _): WithRejection<
        axum_extra::extract::Query<MultiTickerParams>,
        AppError,
    >,
) -> Result<Json<Value>, AppError> {
    let minutes = parse_minutes(params.minutes.as_deref())?;
    let matrix = state
        .service
        .get_correlation_matrix(&params.ticker, minutes)
        .await?;
    Ok(Json(json!({ "success": true, "data": matrix })))
}
