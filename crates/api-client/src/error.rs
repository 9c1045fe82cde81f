use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller input rejected before anything was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Missing client credentials. Please register first.")]
    MissingCredentials,

    #[error("Invalid client credentials")]
    InvalidCredentials,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not authenticated. Please get an auth token first.")]
    Unauthenticated,

    #[error("Authentication token expired. Please get a new token.")]
    TokenExpired,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Any other non-2xx answer from the price service.
    #[error("The API request returned status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<core_types::CoreError> for ApiError {
    fn from(err: core_types::CoreError) -> Self {
        ApiError::Validation(err.to_string())
    }
}
