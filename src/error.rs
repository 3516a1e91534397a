//! Error types for the digest pipeline.
//!
//! Only [`ConfigError`] is allowed to escape to the caller: it is raised while
//! building clients at start-up. The other error types are produced inside the
//! pipeline and converted into fallback values before they reach the
//! presentation layer.

use thiserror::Error;

/// Why a single article page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the fetch timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with anything other than `200 OK`.
    #[error("failed to fetch article, status code: {0}")]
    HttpStatus(u16),

    /// Connection, DNS, TLS or body read failure.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Failures of a generative model invocation or of decoding its reply.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport-level failure talking to the model endpoint.
    #[error("model request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The model call exceeded its timeout.
    #[error("model request timed out")]
    Timeout,

    /// The endpoint returned a non-success status.
    #[error("model API error (status {status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated for readability
        body: String,
    },

    /// The completion contained no message content.
    #[error("model returned an empty reply")]
    EmptyReply,

    /// The reply was JSON-ish but did not match the expected shape.
    #[error("model output failed schema validation: {0}")]
    Schema(#[source] serde_json::Error),

    /// The reply ended mid-document, usually a token limit.
    #[error("model output was truncated: {0}")]
    Truncated(#[source] serde_json::Error),

    /// A link in the reply is not an absolute http(s) URL.
    #[error("model output contained an invalid link: {0}")]
    InvalidLink(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Request(e)
        }
    }
}

impl ModelError {
    /// Classify a decoding error of model output.
    pub fn from_decode(e: serde_json::Error) -> Self {
        if crate::utils::looks_truncated(&e) {
            ModelError::Truncated(e)
        } else {
            ModelError::Schema(e)
        }
    }
}

/// Failures of the news search API.
#[derive(Debug, Error)]
pub enum NewsError {
    /// HTTP request failed
    #[error("news request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status without a structured error payload
    #[error("news API returned status {0}")]
    Status(u16),

    /// The API reported an error in its payload
    #[error("news API error ({code}): {message}")]
    Api {
        /// Error code from the API, e.g. `apiKeyInvalid`
        code: String,
        /// Human-readable message from the API
        message: String,
    },

    /// Failed to parse the API response
    #[error("failed to decode news response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Start-up configuration failures. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential was not supplied on the command line or in the environment.
    #[error("{0} not set (pass it as a flag, export it, or add it to .env)")]
    MissingCredential(&'static str),

    /// The settings file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`crate::config::Settings`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was parsed
        path: String,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// An HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
