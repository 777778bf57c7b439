//! Company facts and price metric formatting

use serde::{Deserialize, Serialize};

use crate::series::PriceSeries;

/// Placeholder for missing text fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Raw company metadata as returned by the market-data provider.
///
/// Every field is optional; the provider may leave any of them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub volume: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl CompanyProfile {
    /// True when the provider returned nothing at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One labelled line of the company information card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoField {
    pub label: &'static str,
    pub value: String,
}

/// Format a rupee amount with Indian magnitude units.
///
/// ```
/// use stock_dash::company::format_large_number;
/// assert_eq!(format_large_number(25_000_000.0), "₹2.50Cr");
/// ```
pub fn format_large_number(number: f64) -> String {
    let number = if number.is_finite() { number } else { 0.0 };

    if number >= 1e9 {
        format!("₹{:.2}B", number / 1e9)
    } else if number >= 1e7 {
        format!("₹{:.2}Cr", number / 1e7)
    } else if number >= 1e5 {
        format!("₹{:.2}L", number / 1e5)
    } else {
        format!("₹{number:.2}")
    }
}

fn text_or_na(value: Option<&String>) -> String {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Display fields for the company information card.
///
/// Missing numbers show as zero and missing text as "N/A"; an empty profile
/// yields no fields.
pub fn company_info(profile: &CompanyProfile) -> Vec<InfoField> {
    if profile.is_empty() {
        return Vec::new();
    }

    let amount = |v: Option<f64>| format_large_number(v.unwrap_or(0.0));
    let pe = profile.trailing_pe.filter(|v| v.is_finite()).unwrap_or(0.0);

    vec![
        InfoField {
            label: "Market Cap",
            value: amount(profile.market_cap),
        },
        InfoField {
            label: "52 Week High",
            value: amount(profile.fifty_two_week_high),
        },
        InfoField {
            label: "52 Week Low",
            value: amount(profile.fifty_two_week_low),
        },
        InfoField {
            label: "P/E Ratio",
            value: format!("{pe:.2}"),
        },
        InfoField {
            label: "Volume",
            value: amount(profile.volume),
        },
        InfoField {
            label: "Sector",
            value: text_or_na(profile.sector.as_ref()),
        },
        InfoField {
            label: "Industry",
            value: text_or_na(profile.industry.as_ref()),
        },
    ]
}

/// Latest price and its change against the previous bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMetric {
    pub current_price: f64,
    pub change_percent: Option<f64>,
    /// e.g. `₹2450.10`
    pub price_display: String,
    /// e.g. `+1.25%`
    pub change_display: Option<String>,
}

impl PriceMetric {
    pub fn is_positive(&self) -> bool {
        self.change_percent.is_some_and(|c| c > 0.0)
    }
}

/// Current price metric, `None` for an empty series
pub fn price_metric(series: &PriceSeries) -> Option<PriceMetric> {
    let bars = series.bars();
    let current = bars.last()?.close;

    let change_percent = bars
        .len()
        .checked_sub(2)
        .map(|i| bars[i].close)
        .filter(|prev| *prev != 0.0)
        .map(|prev| (current - prev) / prev * 100.0);

    Some(PriceMetric {
        current_price: current,
        change_percent,
        price_display: format!("₹{current:.2}"),
        change_display: change_percent.map(|c| format!("{c:+.2}%")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::fixtures::series_from_closes;

    #[test]
    fn test_format_large_number_units() {
        assert_eq!(format_large_number(1_500_000_000.0), "₹1.50B");
        assert_eq!(format_large_number(25_000_000.0), "₹2.50Cr");
        assert_eq!(format_large_number(150_000.0), "₹1.50L");
        assert_eq!(format_large_number(500.0), "₹500.00");
    }

    #[test]
    fn test_format_large_number_boundaries() {
        assert_eq!(format_large_number(1e9), "₹1.00B");
        assert_eq!(format_large_number(1e7), "₹1.00Cr");
        assert_eq!(format_large_number(1e5), "₹1.00L");
        assert_eq!(format_large_number(99_999.0), "₹99999.00");
        assert_eq!(format_large_number(0.0), "₹0.00");
        assert_eq!(format_large_number(f64::NAN), "₹0.00");
    }

    #[test]
    fn test_company_info_full_profile() {
        let profile = CompanyProfile {
            long_name: Some("Tata Consultancy Services Limited".to_string()),
            market_cap: Some(14_000_000_000_000.0),
            fifty_two_week_high: Some(4_592.25),
            fifty_two_week_low: Some(3_311.0),
            trailing_pe: Some(31.456),
            volume: Some(2_345_678.0),
            sector: Some("Technology".to_string()),
            industry: Some("Information Technology Services".to_string()),
        };

        let info = company_info(&profile);
        let labels: Vec<_> = info.iter().map(|f| f.label).collect();
        assert_eq!(
            labels,
            vec![
                "Market Cap",
                "52 Week High",
                "52 Week Low",
                "P/E Ratio",
                "Volume",
                "Sector",
                "Industry"
            ]
        );
        assert_eq!(info[0].value, "₹14000.00B");
        assert_eq!(info[1].value, "₹4592.25");
        assert_eq!(info[3].value, "31.46");
        assert_eq!(info[4].value, "₹23.46L");
        assert_eq!(info[5].value, "Technology");
    }

    #[test]
    fn test_company_info_defaults_missing_fields() {
        let profile = CompanyProfile {
            long_name: Some("Some Co".to_string()),
            sector: Some("  ".to_string()),
            ..Default::default()
        };

        let info = company_info(&profile);
        assert_eq!(info[0].value, "₹0.00");
        assert_eq!(info[3].value, "0.00");
        assert_eq!(info[5].value, NOT_AVAILABLE);
        assert_eq!(info[6].value, NOT_AVAILABLE);
    }

    #[test]
    fn test_company_info_empty_profile() {
        assert!(company_info(&CompanyProfile::default()).is_empty());
    }

    #[test]
    fn test_price_metric() {
        let metric = price_metric(&series_from_closes("TCS.NS", &[100.0, 98.0, 99.96])).unwrap();
        assert_eq!(metric.price_display, "₹99.96");
        assert_eq!(metric.change_display.as_deref(), Some("+2.00%"));
        assert!(metric.is_positive());

        let metric = price_metric(&series_from_closes("TCS.NS", &[100.0, 97.5])).unwrap();
        assert_eq!(metric.change_display.as_deref(), Some("-2.50%"));
    }

    #[test]
    fn test_price_metric_single_bar() {
        let metric = price_metric(&series_from_closes("TCS.NS", &[42.0])).unwrap();
        assert_eq!(metric.change_percent, None);
        assert!(price_metric(&PriceSeries::empty("TCS.NS")).is_none());
    }
}
