use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx answer; `message` is the API's own message when it sent one
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Request cancelled")]
    Cancelled,
}
