use crate::error::ApiError;
use crate::responses::{AuthResponse, RegisterResponse};
use crate::session::Session;
use crate::transport::{RemoteRequest, Transport};
use core_types::{Credentials, RegistrationDetails, Token};
use serde_json::json;
use std::sync::Arc;

/// Owns every call to the remote identity endpoints and is the only writer of
/// the [`Session`].
#[derive(Clone)]
pub struct AuthGateway {
    transport: Arc<dyn Transport>,
    session: Session,
}

impl AuthGateway {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Registers a client and stores the issued credentials.
    ///
    /// Every field of `details` must be non-empty; this is checked before
    /// anything is sent.
    pub async fn register(&self, details: &RegistrationDetails) -> Result<Credentials, ApiError> {
        details.validate()?;

        let body = serde_json::to_value(details)
            .map_err(|e| ApiError::Validation(format!("cannot encode registration: {e}")))?;
        tracing::info!(email = %details.email, "Registering client with the evaluation service.");
        let response = self.transport.send(RemoteRequest::post(&["register"], body)).await?;

        if !response.is_success() {
            return Err(ApiError::Registration(response.body));
        }

        let parsed: RegisterResponse = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Registration(format!("unreadable registration response: {e}")))?;
        let (Some(client_id), Some(client_secret)) = (parsed.client_id, parsed.client_secret) else {
            return Err(ApiError::Registration(
                "invalid registration response: missing credentials".to_string(),
            ));
        };

        let credentials = Credentials::new(client_id, client_secret);
        self.session.store_credentials(credentials.clone()).await;
        tracing::info!(client_id = %credentials.client_id, "Registration successful.");
        Ok(credentials)
    }

    /// Exchanges the stored credentials for a fresh bearer token.
    pub async fn authenticate(&self) -> Result<Token, ApiError> {
        let credentials = self
            .session
            .credentials()
            .await
            .ok_or(ApiError::MissingCredentials)?;

        let body = json!({
            "clientId": credentials.client_id,
            "clientSecret": credentials.client_secret,
        });
        let response = self.transport.send(RemoteRequest::post(&["auth"], body)).await?;

        if response.status == 401 {
            tracing::warn!(client_id = %credentials.client_id, "Credentials were rejected.");
            return Err(ApiError::InvalidCredentials);
        }
        if !response.is_success() {
            return Err(ApiError::Authentication(response.body));
        }

        let token = serde_json::from_str::<AuthResponse>(&response.body)
            .ok()
            .and_then(|r| r.token)
            .filter(|t| !t.is_empty())
            .map(Token::new)
            .ok_or_else(|| {
                ApiError::Authentication("invalid authentication response: missing token".to_string())
            })?;

        self.session.store_token(token.clone()).await;
        tracing::info!(token = %token.masked(), "Authentication successful.");
        Ok(token)
    }

    /// The token currently held, without touching the network.
    pub async fn current_token(&self) -> Option<Token> {
        self.session.token().await
    }

    /// Returns the held token, authenticating first if there is none.
    pub async fn ensure_token(&self) -> Result<Token, ApiError> {
        match self.current_token().await {
            Some(token) => Ok(token),
            None => self.authenticate().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, ScriptedTransport};

    fn details() -> RegistrationDetails {
        RegistrationDetails {
            email: "ada@example.com".into(),
            name: "Ada".into(),
            mobile_no: "9999999999".into(),
            github_username: "ada".into(),
            roll_no: "42".into(),
            college_name: "Analytical".into(),
            access_code: "xyz".into(),
        }
    }

    fn gateway(session: Session) -> (Arc<ScriptedTransport>, AuthGateway) {
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = AuthGateway::new(transport.clone(), session);
        (transport, gateway)
    }

    #[tokio::test]
    async fn register_rejects_empty_fields_without_sending() {
        let (transport, gateway) = gateway(Session::new());
        let mut incomplete = details();
        incomplete.roll_no.clear();

        let err = gateway.register(&incomplete).await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("rollNo")));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn register_stores_credentials() {
        let (transport, gateway) = gateway(Session::new());
        transport.respond(
            Method::Post,
            "/register",
            200,
            r#"{"clientId":"id-1","clientSecret":"secret-1","email":"ada@example.com"}"#,
        );

        let creds = gateway.register(&details()).await.unwrap();

        assert_eq!(creds, Credentials::new("id-1", "secret-1"));
        assert_eq!(gateway.session().credentials().await, Some(creds));
        let sent = &transport.requests()[0];
        assert_eq!(sent.body.as_ref().unwrap()["accessCode"], "xyz");
        assert!(sent.bearer.is_none());
    }

    #[tokio::test]
    async fn register_wraps_remote_error_body() {
        let (transport, gateway) = gateway(Session::new());
        transport.respond(Method::Post, "/register", 409, r#"{"message":"already registered"}"#);

        let err = gateway.register(&details()).await.unwrap_err();

        assert!(matches!(err, ApiError::Registration(ref body) if body.contains("already registered")));
        assert!(gateway.session().credentials().await.is_none());
    }

    #[tokio::test]
    async fn register_requires_both_credentials_in_response() {
        let (transport, gateway) = gateway(Session::new());
        transport.respond(Method::Post, "/register", 200, r#"{"clientId":"id-1"}"#);

        assert!(matches!(
            gateway.register(&details()).await,
            Err(ApiError::Registration(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_requires_credentials() {
        let (transport, gateway) = gateway(Session::new());

        assert!(matches!(
            gateway.authenticate().await,
            Err(ApiError::MissingCredentials)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn authenticate_stores_token() {
        let (transport, gateway) = gateway(Session::with_credentials(Credentials::new("id", "secret")));
        transport.respond(Method::Post, "/auth", 200, r#"{"token":"tok-1","expires_in":300}"#);

        assert!(gateway.current_token().await.is_none());
        let token = gateway.authenticate().await.unwrap();

        assert_eq!(token, Token::new("tok-1"));
        assert_eq!(gateway.current_token().await, Some(token));
        let sent = &transport.requests()[0];
        assert_eq!(sent.body.as_ref().unwrap()["clientId"], "id");
        assert_eq!(sent.body.as_ref().unwrap()["clientSecret"], "secret");
    }

    #[tokio::test]
    async fn authenticate_maps_401_to_invalid_credentials() {
        let (transport, gateway) = gateway(Session::with_credentials(Credentials::new("id", "bad")));
        transport.respond(Method::Post, "/auth", 401, r#"{"message":"nope"}"#);

        assert!(matches!(
            gateway.authenticate().await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(gateway.current_token().await.is_none());
    }

    #[tokio::test]
    async fn authenticate_rejects_other_failures_and_malformed_bodies() {
        let (transport, gateway) = gateway(Session::with_credentials(Credentials::new("id", "secret")));
        transport
            .respond(Method::Post, "/auth", 500, "boom")
            .respond(Method::Post, "/auth", 200, r#"{"access":"x"}"#);

        assert!(matches!(
            gateway.authenticate().await,
            Err(ApiError::Authentication(ref body)) if body == "boom"
        ));
        assert!(matches!(
            gateway.authenticate().await,
            Err(ApiError::Authentication(ref msg)) if msg.contains("missing token")
        ));
    }

    #[tokio::test]
    async fn ensure_token_only_authenticates_when_absent() {
        let (transport, gateway) = gateway(Session::with_credentials(Credentials::new("id", "secret")));
        transport.respond(Method::Post, "/auth", 200, r#"{"token":"tok-1"}"#);

        gateway.ensure_token().await.unwrap();
        gateway.ensure_token().await.unwrap();

        assert_eq!(transport.count(Method::Post, "/auth"), 1);
    }
}
