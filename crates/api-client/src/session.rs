use core_types::{Credentials, Token};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct SessionState {
    credentials: Option<Credentials>,
    token: Option<Token>,
}

/// The credential store: client credentials plus the last issued bearer token.
///
/// Cloning yields another handle to the same state. The [`AuthGateway`] is the
/// only writer; the [`PriceFetcher`] only reads.
///
/// [`AuthGateway`]: crate::AuthGateway
/// [`PriceFetcher`]: crate::PriceFetcher
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts out with credentials from an earlier registration.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                credentials: Some(credentials),
                token: None,
            })),
        }
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.state.read().await.credentials.clone()
    }

    pub async fn token(&self) -> Option<Token> {
        self.state.read().await.token.clone()
    }

    pub(crate) async fn store_credentials(&self, credentials: Credentials) {
        self.state.write().await.credentials = Some(credentials);
    }

    pub(crate) async fn store_token(&self, token: Token) {
        self.state.write().await.token = Some(token);
    }
}
