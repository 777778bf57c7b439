//! Configuration for dashboard operations

use crate::error::{DashboardError, Result};
use crate::market::Exchange;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Longest default history span accepted, in days
pub const MAX_HISTORY_DAYS: i64 = 36_500;

/// Configuration for the dashboard and its data sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Exchange assumed for bare symbols
    pub default_exchange: Exchange,

    /// NewsAPI.org key (optional; news is skipped without it)
    pub news_api_key: Option<String>,

    /// How far back headlines are searched, in days
    pub news_lookback_days: u32,

    /// Maximum number of headlines shown
    pub news_limit: usize,

    /// Client-side request budget for the news API, per minute
    pub news_rate_limit: u32,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Default span of price history, in days, when no start date is given
    pub default_history_days: i64,

    /// How often the page re-runs the current lookup
    pub refresh_interval: Duration,

    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Idle time after which a browser session is dropped
    pub session_ttl: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_exchange: Exchange::Nse,
            news_api_key: None,
            news_lookback_days: 7,
            news_limit: 5,
            news_rate_limit: 60,
            request_timeout: Duration::from_secs(30),
            default_history_days: 365,
            refresh_interval: Duration::from_secs(300), // 5 minutes
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            session_ttl: Duration::from_secs(3600),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Load overrides from environment variables
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.news_limit == 0 {
            return Err(DashboardError::ConfigError(
                "news_limit must be greater than 0".to_string(),
            ));
        }

        if self.news_lookback_days == 0 {
            return Err(DashboardError::ConfigError(
                "news_lookback_days must be greater than 0".to_string(),
            ));
        }

        if !(1..=MAX_HISTORY_DAYS).contains(&self.default_history_days) {
            return Err(DashboardError::ConfigError(format!(
                "default_history_days must be between 1 and {MAX_HISTORY_DAYS}"
            )));
        }

        if self.refresh_interval.is_zero() {
            return Err(DashboardError::ConfigError(
                "refresh_interval must be greater than 0".to_string(),
            ));
        }

        if self.news_api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
            return Err(DashboardError::ConfigError(
                "news_api_key must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for DashboardConfig
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    default_exchange: Option<Exchange>,
    news_api_key: Option<String>,
    news_lookback_days: Option<u32>,
    news_limit: Option<usize>,
    news_rate_limit: Option<u32>,
    request_timeout: Option<Duration>,
    default_history_days: Option<i64>,
    refresh_interval: Option<Duration>,
    bind_addr: Option<SocketAddr>,
    session_ttl: Option<Duration>,
    env_errors: Vec<String>,
}

impl DashboardConfigBuilder {
    /// Set the exchange used for bare symbols
    pub fn default_exchange(mut self, exchange: Exchange) -> Self {
        self.default_exchange = Some(exchange);
        self
    }

    /// Set the NewsAPI key
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    /// Set the headline lookback window
    pub fn news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = Some(days);
        self
    }

    /// Set the maximum number of headlines
    pub fn news_limit(mut self, limit: usize) -> Self {
        self.news_limit = Some(limit);
        self
    }

    /// Set the news API request budget per minute
    pub fn news_rate_limit(mut self, per_minute: u32) -> Self {
        self.news_rate_limit = Some(per_minute);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the default history span
    pub fn default_history_days(mut self, days: i64) -> Self {
        self.default_history_days = Some(days);
        self
    }

    /// Set the page refresh interval
    pub fn refresh_interval(mut self, duration: Duration) -> Self {
        self.refresh_interval = Some(duration);
        self
    }

    /// Set the server bind address
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Set the idle session lifetime
    pub fn session_ttl(mut self, duration: Duration) -> Self {
        self.session_ttl = Some(duration);
        self
    }

    /// Load settings from `NEWS_API_KEY`, `STOCK_DASH_BIND`,
    /// `STOCK_DASH_REFRESH_SECS` and `STOCK_DASH_EXCHANGE`.
    ///
    /// The log format is read by `dash_utils::Config`.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            self.news_api_key = Some(key);
        }

        if let Ok(bind) = std::env::var("STOCK_DASH_BIND") {
            match bind.parse() {
                Ok(addr) => self.bind_addr = Some(addr),
                Err(e) => self.env_errors.push(format!("STOCK_DASH_BIND: {e}")),
            }
        }

        if let Ok(secs) = std::env::var("STOCK_DASH_REFRESH_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.refresh_interval = Some(Duration::from_secs(secs)),
                Err(e) => self.env_errors.push(format!("STOCK_DASH_REFRESH_SECS: {e}")),
            }
        }

        if let Ok(exchange) = std::env::var("STOCK_DASH_EXCHANGE") {
            match exchange.parse() {
                Ok(exchange) => self.default_exchange = Some(exchange),
                Err(e) => self.env_errors.push(format!("STOCK_DASH_EXCHANGE: {e}")),
            }
        }

        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashboardConfig> {
        if !self.env_errors.is_empty() {
            return Err(DashboardError::ConfigError(self.env_errors.join("; ")));
        }

        let defaults = DashboardConfig::default();

        let config = DashboardConfig {
            default_exchange: self.default_exchange.unwrap_or(defaults.default_exchange),
            news_api_key: self.news_api_key,
            news_lookback_days: self.news_lookback_days.unwrap_or(defaults.news_lookback_days),
            news_limit: self.news_limit.unwrap_or(defaults.news_limit),
            news_rate_limit: self.news_rate_limit.unwrap_or(defaults.news_rate_limit),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            default_history_days: self
                .default_history_days
                .unwrap_or(defaults.default_history_days),
            refresh_interval: self.refresh_interval.unwrap_or(defaults.refresh_interval),
            bind_addr: self.bind_addr.unwrap_or(defaults.bind_addr),
            session_ttl: self.session_ttl.unwrap_or(defaults.session_ttl),
        };

        config.validate()?;
        Ok(config)
    }
}
