//! Error types for dashboard operations

use serde::Serialize;
use thiserror::Error;

/// Dashboard specific errors
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Input series or request cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// News API error
    #[error("News API error: {0}")]
    NewsApiError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Page template error
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of a failed upstream lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The symbol or its data does not exist upstream
    NotFound,
    /// The lookup might succeed if repeated later
    Transient,
}

impl DashboardError {
    /// Classify the error for callers that care about retrying
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_)
            | Self::InvalidSymbol(_)
            | Self::DataUnavailable { .. }
            | Self::IndicatorError(_) => FailureKind::NotFound,
            Self::RateLimitExceeded { .. }
            | Self::NetworkError(_)
            | Self::JsonError(_)
            | Self::YahooFinanceError(_)
            | Self::NewsApiError(_)
            | Self::ConfigError(_)
            | Self::TemplateError(_)
            | Self::Other(_) => FailureKind::Transient,
        }
    }

    /// Shorthand for [`DashboardError::DataUnavailable`]
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Convert anyhow::Error to DashboardError
impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Other(err.to_string())
    }
}
