use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum CcError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// Authentication with the API failed (missing key, rejected key, or a malformed
    /// token response).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The data received from the API was in an unexpected format or was missing a
    /// required field, or caller-supplied input failed validation.
    #[error("Data format unexpected or missing field: {0}")]
    Data(String),

    /// The connectivity monitor reports the network as offline; the operation was
    /// short-circuited instead of waiting out retries against a dead link.
    #[error("network is offline")]
    Offline,
}
