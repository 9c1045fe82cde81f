use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(transparent)]
    Api(#[from] api_client::ApiError),

    #[error(transparent)]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
