use std::sync::Arc;
use std::time::Duration;

mod auth;
pub mod error;
pub mod fetcher;
pub mod responses;
pub mod session;
pub mod transport;

// --- Public API ---
pub use auth::AuthGateway;
pub use error::ApiError;
pub use fetcher::{PriceFetcher, PriceSource};
pub use session::Session;
pub use transport::{HttpTransport, Method, RemoteRequest, RemoteResponse, ScriptedTransport, Transport};

/// The auth gateway and the price fetcher wired to one transport and one session.
#[derive(Clone)]
pub struct StockClient {
    pub gateway: AuthGateway,
    pub fetcher: PriceFetcher,
}

impl StockClient {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            gateway: AuthGateway::new(transport.clone(), session.clone()),
            fetcher: PriceFetcher::new(transport, session),
        }
    }

    /// A client talking HTTP to `base_url`.
    pub fn http(base_url: &str, timeout: Duration, session: Session) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(base_url, timeout)?;
        Ok(Self::new(Arc::new(transport), session))
    }
}
