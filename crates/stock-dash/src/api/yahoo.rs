//! Yahoo Finance API client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

use super::MarketDataProvider;
use crate::company::CompanyProfile;
use crate::error::{DashboardError, Result};
use crate::market::HistoryRange;
use crate::series::{Bar, PriceSeries};

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-dash";

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Get historical bars for a symbol at the requested interval
    pub async fn get_history(&self, symbol: &str, range: HistoryRange) -> Result<PriceSeries> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DashboardError::YahooFinanceError(e.to_string()))?;

        // Convert chrono DateTime to time OffsetDateTime
        let start = to_offset(range.start)?;
        let end = to_offset(range.end)?;

        tracing::debug!(
            symbol,
            interval = %range.interval,
            start = %range.start,
            end = %range.end,
            "Fetching history"
        );

        let response = provider
            .get_quote_history_interval(symbol, start, end, range.interval.as_str())
            .await
            .map_err(|e| classify_yahoo_error(symbol, &e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| DashboardError::unavailable(symbol, e.to_string()))?;

        let bars = quotes
            .iter()
            .filter_map(|q| {
                let timestamp = DateTime::from_timestamp(q.timestamp as i64, 0)?;
                Some(Bar {
                    timestamp,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        let series = PriceSeries::from_unordered(symbol, bars);
        if series.is_empty() {
            return Err(DashboardError::unavailable(symbol, "no price history returned"));
        }

        Ok(series)
    }

    /// Get company metadata from the quote summary endpoint
    pub async fn get_company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");

        let response = self
            .client
            .get(&url)
            .query(&[("modules", SUMMARY_MODULES)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DashboardError::RateLimitExceeded {
                provider: "Yahoo Finance".to_string(),
            });
        }

        let body = response.text().await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DashboardError::unavailable(symbol, "quote summary not found"));
        }
        if !status.is_success() {
            return Err(DashboardError::YahooFinanceError(format!(
                "quote summary HTTP {status}"
            )));
        }

        parse_quote_summary(symbol, &body)
    }
}

fn to_offset(at: DateTime<Utc>) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| DashboardError::InvalidInput(format!("Invalid timestamp {at}: {e}")))
}

/// Map a connector error message to not-found or transient
fn classify_yahoo_error(symbol: &str, message: &str) -> DashboardError {
    let lower = message.to_ascii_lowercase();
    let not_found = ["not found", "404", "no data", "delisted", "no quotes", "no result"]
        .iter()
        .any(|needle| lower.contains(needle));

    if not_found {
        DashboardError::unavailable(symbol, message)
    } else if lower.contains("too many requests") || lower.contains("429") {
        DashboardError::RateLimitExceeded {
            provider: "Yahoo Finance".to_string(),
        }
    } else {
        DashboardError::YahooFinanceError(message.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default)]
    market_cap: RawValue,
    #[serde(default)]
    fifty_two_week_high: RawValue,
    #[serde(default)]
    fifty_two_week_low: RawValue,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: RawValue,
    #[serde(default)]
    volume: RawValue,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when absent
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Parse a quote summary response body into a profile
fn parse_quote_summary(symbol: &str, body: &str) -> Result<CompanyProfile> {
    let envelope: QuoteSummaryEnvelope = serde_json::from_str(body)?;
    let summary = envelope.quote_summary;

    if let Some(error) = summary.error {
        let message = format!("{}: {}", error.code, error.description);
        return Err(if error.code.eq_ignore_ascii_case("not found") {
            DashboardError::unavailable(symbol, message)
        } else {
            DashboardError::YahooFinanceError(message)
        });
    }

    let result = summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DashboardError::unavailable(symbol, "empty quote summary"))?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let asset = result.asset_profile.unwrap_or_default();

    Ok(CompanyProfile {
        long_name: price.long_name.or(price.short_name),
        market_cap: detail.market_cap.raw,
        fifty_two_week_high: detail.fifty_two_week_high.raw,
        fifty_two_week_low: detail.fifty_two_week_low.raw,
        trailing_pe: detail.trailing_pe.raw,
        volume: detail.volume.raw,
        sector: asset.sector,
        industry: asset.industry,
    })
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn history(&self, symbol: &str, range: HistoryRange) -> Result<PriceSeries> {
        self.get_history(symbol, range).await
    }

    async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.get_company_profile(symbol).await
    }
}
