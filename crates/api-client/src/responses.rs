use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.
// Fields are optional so that a well-formed but incomplete body can be reported precisely.

/// The response from a successful `POST /register` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// The response from a successful `POST /auth` request.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: Option<String>,
}
