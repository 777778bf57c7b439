//! API clients for market data and news providers

pub mod news_api;
pub mod yahoo;

use async_trait::async_trait;

use crate::company::CompanyProfile;
use crate::error::Result;
use crate::market::HistoryRange;
use crate::series::PriceSeries;

pub use news_api::{NewsApiClient, NewsItem};
pub use yahoo::YahooFinanceClient;

/// Source of price history and company metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Bars for `symbol` inside `range`
    async fn history(&self, symbol: &str, range: HistoryRange) -> Result<PriceSeries>;

    /// Company metadata for `symbol`
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile>;
}

/// Source of news headlines
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Up to `limit` headlines about `company` from the last `lookback_days`,
    /// most relevant first
    async fn headlines(&self, company: &str, lookback_days: u32, limit: usize)
    -> Result<Vec<NewsItem>>;
}
