//! Stock lookup dashboard for NSE/BSE listed companies
//!
//! A lookup fetches price history and company metadata from Yahoo Finance,
//! computes moving averages, RSI, MACD and Bollinger Bands, arranges them
//! into a three-panel chart, formats company facts in rupees, and attaches
//! recent headlines from NewsAPI. Results are served as a web dashboard
//! ([`web`]) or printed to the terminal ([`terminal`]).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stock_dash::{Dashboard, DashboardConfig, DashboardSession, LookupRequest, Exchange};
//! use stock_dash::api::{NewsApiClient, YahooFinanceClient};
//!
//! # async fn example() -> stock_dash::Result<()> {
//! let config = DashboardConfig::from_env()?;
//! let market = YahooFinanceClient::new(config.request_timeout)?;
//! let news = NewsApiClient::new(
//!     config.news_api_key.clone(),
//!     config.news_rate_limit,
//!     config.request_timeout,
//! )?;
//!
//! let dashboard = Dashboard::new(Arc::new(market), Arc::new(news), config);
//! let view = dashboard
//!     .lookup(&LookupRequest::new("TCS", Exchange::Nse), &DashboardSession::new())
//!     .await;
//! println!("{}", stock_dash::terminal::render_view(&view));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chart;
pub mod company;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod indicators;
pub mod market;
pub mod refresh;
pub mod series;
pub mod session;
pub mod terminal;
pub mod web;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardView, StockView};
pub use error::{DashboardError, FailureKind, Result};
pub use market::{Exchange, Interval, LookupRequest};
pub use series::{Bar, PriceSeries};
pub use session::{DashboardSession, SessionStore, Watchlist};
