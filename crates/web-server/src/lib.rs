use analyzer::AnalyticsService;
use api_client::{Session, StockClient};
use axum::{middleware, routing::get, Router};
use configuration::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub service: AnalyticsService,
}

/// Builds the analytics facade described by `config`.
pub fn build_service(config: &Config) -> anyhow::Result<AnalyticsService> {
    let session = match config.credentials.credentials() {
        Some(credentials) => Session::with_credentials(credentials),
        None => {
            tracing::warn!("No client credentials configured.");
            Session::new()
        }
    };
    let client = StockClient::http(
        &config.remote.base_url,
        Duration::from_secs(config.remote.timeout_secs),
        session,
    )?;
    Ok(AnalyticsService::from_client(
        client,
        config.remote.reauth_on_expiry,
    ))
}

/// Defines the application routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    // Every data route needs a token; the middleware fetches one if none is held.
    let data_routes = Router::new()
        .route("/average", get(handlers::get_average))
        .route("/correlation", get(handlers::get_correlation))
        .route("/stocks", get(handlers::get_all_stocks))
        .route("/stocks/:ticker", get(handlers::get_stock_history))
        .route("/stockcorrelation", get(handlers::get_stock_correlation))
        .route("/correlationmatrix", get(handlers::get_correlation_matrix))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_token,
        ));

    Router::new()
        .route("/", get(handlers::health))
        .merge(data_routes)
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let app = build_router(Arc::new(AppState { service }));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
