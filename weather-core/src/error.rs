use std::fmt;

use thiserror::Error;

/// Which provider endpoint an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    /// Path segment appended to the provider base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Current => f.write_str("current conditions"),
            Endpoint::Forecast => f.write_str("forecast"),
        }
    }
}

/// Failure talking to the weather provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{endpoint} request failed: {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response contained no weather condition")]
    MissingCondition { endpoint: Endpoint },
}

impl ProviderError {
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            ProviderError::Client(_) => None,
            ProviderError::Request { endpoint, .. }
            | ProviderError::Status { endpoint, .. }
            | ProviderError::Parse { endpoint, .. }
            | ProviderError::MissingCondition { endpoint } => Some(*endpoint),
        }
    }
}

/// Rejected search submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Please enter a city name.")]
    EmptyInput,
}
