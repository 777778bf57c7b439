//! Exchanges, bar intervals, symbol normalization and lookup requests

use crate::error::{DashboardError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SYMBOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9][A-Z0-9&_.\-]*$").expect("symbol pattern is valid")
});

/// Indian exchange a symbol is listed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// National Stock Exchange (`.NS`)
    #[default]
    Nse,
    /// Bombay Stock Exchange (`.BO`)
    Bse,
}

impl Exchange {
    /// All recognized exchanges, in display order
    pub const ALL: [Exchange; 2] = [Exchange::Nse, Exchange::Bse];

    /// Yahoo Finance ticker suffix
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Nse => ".NS",
            Self::Bse => ".BO",
        }
    }

    /// Short display code
    pub fn code(self) -> &'static str {
        match self {
            Self::Nse => "NSE",
            Self::Bse => "BSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Exchange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NSE" | "NS" => Ok(Self::Nse),
            "BSE" | "BO" => Ok(Self::Bse),
            other => Err(DashboardError::InvalidInput(format!(
                "Unknown exchange: {other} (expected NSE or BSE)"
            ))),
        }
    }
}

/// Bar interval supported by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
}

impl Interval {
    /// All supported intervals, in display order
    pub const ALL: [Interval; 4] = [
        Interval::OneDay,
        Interval::OneHour,
        Interval::FifteenMinutes,
        Interval::FiveMinutes,
    ];

    /// Interval code as understood by Yahoo Finance
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::OneHour => "1h",
            Self::FifteenMinutes => "15m",
            Self::FiveMinutes => "5m",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1d" => Ok(Self::OneDay),
            "1h" => Ok(Self::OneHour),
            "15m" => Ok(Self::FifteenMinutes),
            "5m" => Ok(Self::FiveMinutes),
            other => Err(DashboardError::InvalidInput(format!(
                "Unsupported interval: {other}. Supported: 1d, 1h, 15m, 5m"
            ))),
        }
    }
}

/// Normalize user input into a Yahoo Finance ticker.
///
/// Symbols already qualified with `.NS` or `.BO` are kept as they are; bare
/// symbols get the suffix of `exchange`.
pub fn normalize_symbol(query: &str, exchange: Exchange) -> Result<String> {
    let symbol = query.trim().to_uppercase();

    if symbol.is_empty() {
        return Err(DashboardError::InvalidSymbol("empty symbol".to_string()));
    }

    if !SYMBOL_PATTERN.is_match(&symbol) {
        return Err(DashboardError::InvalidSymbol(symbol));
    }

    let qualified = Exchange::ALL
        .iter()
        .any(|e| symbol.ends_with(e.suffix()) && symbol.len() > e.suffix().len());

    if qualified {
        Ok(symbol)
    } else {
        Ok(format!("{symbol}{}", exchange.suffix()))
    }
}

/// Time window and bar size of a history request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: Interval,
}

/// One dashboard lookup as entered in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    /// Raw search text
    pub symbol: String,
    #[serde(default)]
    pub exchange: Exchange,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub interval: Interval,
}

impl LookupRequest {
    /// Request with default dates and interval
    pub fn new(symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            start: None,
            end: None,
            interval: Interval::default(),
        }
    }

    /// Set the start date
    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    /// Set the end date
    pub fn end(mut self, date: NaiveDate) -> Self {
        self.end = Some(date);
        self
    }

    /// Set the bar interval
    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Whether the search box is empty
    pub fn is_blank(&self) -> bool {
        self.symbol.trim().is_empty()
    }

    /// Ticker for this request
    pub fn normalized_symbol(&self) -> Result<String> {
        normalize_symbol(&self.symbol, self.exchange)
    }

    /// Resolve the date pickers into a history window.
    ///
    /// A missing end date means today; a missing start date means
    /// `default_days` before the end. The end date is inclusive.
    pub fn history_range(&self, today: NaiveDate, default_days: i64) -> Result<HistoryRange> {
        let end = self.end.unwrap_or(today);
        let start = match self.start {
            Some(start) => start,
            None => days_before(end, default_days)?,
        };

        if start > end {
            return Err(DashboardError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let end_exclusive = end.succ_opt().unwrap_or(end);

        Ok(HistoryRange {
            start: start.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: end_exclusive.and_time(chrono::NaiveTime::MIN).and_utc(),
            interval: self.interval,
        })
    }
}

/// `days` calendar days before `date`, or an error when that leaves the
/// representable date range
pub fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|span| date.checked_sub_signed(span))
        .ok_or_else(|| {
            DashboardError::InvalidInput(format!("{days} days before {date} is out of range"))
        })
}
