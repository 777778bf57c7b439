//! Data access for a single lookup
//!
//! `fetch_*` functions return explicit errors; the `*_or_empty` variants are
//! what the dashboard calls, collapsing every failure into an empty result.

use crate::api::{MarketDataProvider, NewsItem, NewsProvider};
use crate::company::CompanyProfile;
use crate::error::Result;
use crate::market::HistoryRange;
use crate::series::PriceSeries;

/// Price history and metadata for one symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockData {
    pub series: PriceSeries,
    pub profile: CompanyProfile,
}

impl StockData {
    /// Empty history and metadata for a symbol
    pub fn empty(symbol: &str) -> Self {
        Self {
            series: PriceSeries::empty(symbol),
            profile: CompanyProfile::default(),
        }
    }

    /// Whether there is anything to show
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Fetch history, then metadata.
///
/// Either call failing fails the whole fetch; a profile that loads but has
/// missing fields is kept as is.
pub async fn fetch_stock_data(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    range: HistoryRange,
) -> Result<StockData> {
    let series = provider.history(symbol, range).await?;
    let profile = provider.profile(symbol).await?;

    Ok(StockData { series, profile })
}

/// Like [`fetch_stock_data`], with every failure collapsed to empty data
pub async fn fetch_stock_data_or_empty(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    range: HistoryRange,
) -> StockData {
    match fetch_stock_data(provider, symbol, range).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(symbol, kind = ?e.failure_kind(), "Stock lookup failed: {e}");
            StockData::empty(symbol)
        }
    }
}

/// Headlines for a company, or an empty list on any failure
pub async fn fetch_news_or_empty(
    provider: &dyn NewsProvider,
    company: &str,
    lookback_days: u32,
    limit: usize,
) -> Vec<NewsItem> {
    match provider.headlines(company, lookback_days, limit).await {
        Ok(mut items) => {
            items.truncate(limit);
            items
        }
        Err(e) => {
            tracing::warn!(company, "Error fetching news: {e}");
            Vec::new()
        }
    }
}
