//! NewsAPI.org client for company headlines

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::NewsProvider;
use crate::error::{DashboardError, Result};

const BASE_URL: &str = "https://newsapi.org/v2/everything";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// A headline shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub source: String,
}

/// NewsAPI.org client for the `everything` endpoint
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: Option<String>,
    rate_limiter: SharedRateLimiter,
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl NewsApiClient {
    /// Create a new client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - NewsAPI key; without one every request fails fast
    /// * `rate_limit` - Requests per minute
    /// * `request_timeout` - Per-request timeout
    pub fn new(api_key: Option<String>, rate_limit: u32, request_timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            api_key,
            rate_limiter,
        })
    }

    /// Search recent articles mentioning `company`
    ///
    /// # Arguments
    /// * `company` - Company display name
    /// * `lookback_days` - Size of the search window ending today
    /// * `limit` - Maximum number of items returned
    pub async fn get_company_news(
        &self,
        company: &str,
        lookback_days: u32,
        limit: usize,
    ) -> Result<Vec<NewsItem>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DashboardError::ConfigError("NEWS_API_KEY is not set".to_string())
        })?;

        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(i64::from(lookback_days));
        let url = build_search_url(BASE_URL, api_key, company, from, to)?;

        self.rate_limiter.until_ready().await;

        tracing::debug!(company, %from, %to, "Searching news");

        let response = self.client.get(url).send().await.map_err(|e| {
            DashboardError::NewsApiError(format!("NewsAPI request failed: {}", e.without_url()))
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DashboardError::RateLimitExceeded {
                provider: "NewsAPI".to_string(),
            });
        }

        parse_search_response(&body, limit).map_err(|e| match e {
            DashboardError::JsonError(_) if !status.is_success() => {
                DashboardError::NewsApiError(format!("NewsAPI HTTP {status}"))
            }
            other => other,
        })
    }
}

/// Query URL for an `everything` search sorted by relevancy
fn build_search_url(
    base: &str,
    api_key: &str,
    company: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Url> {
    let query = format!("{company} stock");
    let from = from.format("%Y-%m-%d").to_string();
    let to = to.format("%Y-%m-%d").to_string();

    Url::parse_with_params(
        base,
        &[
            ("q", query.as_str()),
            ("language", "en"),
            ("from", from.as_str()),
            ("to", to.as_str()),
            ("sortBy", "relevancy"),
            ("apiKey", api_key),
        ],
    )
    .map_err(|e| DashboardError::ConfigError(format!("Invalid news URL: {e}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    status: String,
    #[serde(default)]
    articles: Vec<ApiArticle>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    #[serde(default)]
    source: Option<ApiSource>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    #[serde(default)]
    name: Option<String>,
}

/// Turn a response body into at most `limit` headlines, keeping API order
fn parse_search_response(body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    if response.status != "ok" {
        let code = response.code.unwrap_or_default();
        let message = response.message.unwrap_or_default();
        return Err(if code == "rateLimited" {
            DashboardError::RateLimitExceeded {
                provider: "NewsAPI".to_string(),
            }
        } else {
            DashboardError::NewsApiError(format!("{code}: {message}"))
        });
    }

    Ok(response
        .articles
        .into_iter()
        .filter_map(|article| {
            let headline = article.title.filter(|t| !t.trim().is_empty())?;
            let source = article
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string());
            Some(NewsItem { headline, source })
        })
        .take(limit)
        .collect())
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn headlines(
        &self,
        company: &str,
        lookback_days: u32,
        limit: usize,
    ) -> Result<Vec<NewsItem>> {
        self.get_company_news(company, lookback_days, limit).await
    }
}
