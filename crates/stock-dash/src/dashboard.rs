//! Lookup orchestration: one request in, one renderable view out

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::api::{MarketDataProvider, NewsItem, NewsProvider};
use crate::chart::{PlotSpec, build_price_chart};
use crate::company::{InfoField, PriceMetric, company_info, price_metric};
use crate::config::DashboardConfig;
use crate::data::{fetch_news_or_empty, fetch_stock_data_or_empty};
use crate::indicators::{AnalyzedSeries, analyze};
use crate::market::LookupRequest;
use crate::session::DashboardSession;

/// Shown when the news list comes back empty
pub const NO_NEWS_MESSAGE: &str = "No recent news found for this company.";

/// Shown when the search box is empty
pub const PROMPT_MESSAGE: &str = "Enter a stock symbol to get started.";

/// The single message used for any failed lookup
pub fn not_found_message(symbol: &str) -> String {
    format!("Could not find data for {symbol}. Please check if the symbol is correct and try again.")
}

/// Everything the main area shows for a loaded symbol
#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    pub symbol: String,
    pub company_name: String,
    /// `"{company_name} ({symbol})"`
    pub title: String,
    pub price: PriceMetric,
    pub chart: PlotSpec,
    pub company_info: Vec<InfoField>,
    pub news: Vec<NewsItem>,
    pub in_watchlist: bool,
    #[serde(skip)]
    pub analyzed: AnalyzedSeries,
}

/// Result of a lookup
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardView {
    /// Nothing entered yet
    Prompt { message: String },
    /// Lookup failed; no partial data is shown
    NotFound { symbol: String, message: String },
    Loaded(Box<StockView>),
}

impl DashboardView {
    pub fn prompt() -> Self {
        Self::Prompt {
            message: PROMPT_MESSAGE.to_string(),
        }
    }

    pub fn not_found(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let message = not_found_message(&symbol);
        Self::NotFound { symbol, message }
    }

    pub fn as_loaded(&self) -> Option<&StockView> {
        match self {
            Self::Loaded(view) => Some(view),
            _ => None,
        }
    }
}

/// Runs lookups against the configured providers
#[derive(Clone)]
pub struct Dashboard {
    market: Arc<dyn MarketDataProvider>,
    news: Arc<dyn NewsProvider>,
    config: DashboardConfig,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("default_exchange", &self.config.default_exchange)
            .field("news_limit", &self.config.news_limit)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsProvider>,
        config: DashboardConfig,
    ) -> Self {
        Self {
            market,
            news,
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Look up a symbol using today's date for open-ended ranges
    pub async fn lookup(&self, request: &LookupRequest, session: &DashboardSession) -> DashboardView {
        self.lookup_on(request, session, Utc::now().date_naive()).await
    }

    /// Look up a symbol as of `today`.
    ///
    /// Every market data failure, history or profile, ends in
    /// [`DashboardView::NotFound`]; a news failure only empties that section.
    pub async fn lookup_on(
        &self,
        request: &LookupRequest,
        session: &DashboardSession,
        today: NaiveDate,
    ) -> DashboardView {
        if request.is_blank() {
            return DashboardView::prompt();
        }

        let raw = request.symbol.trim().to_uppercase();
        let symbol = match request.normalized_symbol() {
            Ok(symbol) => symbol,
            Err(e) => {
                tracing::warn!(symbol = %raw, "Rejected symbol: {e}");
                return DashboardView::not_found(raw);
            }
        };

        let range = match request.history_range(today, self.config.default_history_days) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!(%symbol, "Rejected date range: {e}");
                return DashboardView::not_found(symbol);
            }
        };

        tracing::info!(%symbol, interval = %range.interval, "Looking up stock");

        let data = fetch_stock_data_or_empty(self.market.as_ref(), &symbol, range).await;
        if data.is_empty() {
            return DashboardView::not_found(symbol);
        }

        let profile = data.profile;
        let analyzed = match analyze(data.series) {
            Ok(analyzed) => analyzed,
            Err(e) => {
                tracing::warn!(%symbol, "Indicator calculation failed: {e}");
                return DashboardView::not_found(symbol);
            }
        };

        let Some(price) = price_metric(&analyzed.series) else {
            return DashboardView::not_found(symbol);
        };

        let chart = build_price_chart(&analyzed);
        let info = company_info(&profile);
        let company_name = profile.long_name.clone().unwrap_or_else(|| symbol.clone());

        let news = fetch_news_or_empty(
            self.news.as_ref(),
            &company_name,
            self.config.news_lookback_days,
            self.config.news_limit,
        )
        .await;

        DashboardView::Loaded(Box::new(StockView {
            title: format!("{company_name} ({symbol})"),
            in_watchlist: session.watchlist.contains(&symbol),
            symbol,
            company_name,
            price,
            chart,
            company_info: info,
            news,
            analyzed,
        }))
    }
}
