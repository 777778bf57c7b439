//! Declarative chart description for the charting front end
//!
//! [`build_price_chart`] arranges already computed columns into three stacked
//! panels sharing a time axis. The result is plain data; the page hands it to
//! Plotly for rendering.

use serde::Serialize;

use crate::indicators::{AnalyzedSeries, Column};

pub const PRICE_PANEL_TITLE: &str = "Price and Moving Averages";
pub const RSI_PANEL_TITLE: &str = "RSI";
pub const MACD_PANEL_TITLE: &str = "MACD";

/// RSI overbought reference level
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI oversold reference level
pub const RSI_OVERSOLD: f64 = 30.0;

/// Shape tools added to the chart mode bar
pub const DRAWING_TOOLS: [&str; 6] = [
    "drawline",
    "drawopenpath",
    "drawclosedpath",
    "drawcircle",
    "drawrect",
    "eraseshape",
];

/// One line on a panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub column: Column,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
}

/// Horizontal reference line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub y: f64,
    pub color: &'static str,
    pub dash: &'static str,
}

/// One vertically stacked panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: &'static str,
    pub y_axis_title: &'static str,
    pub height_ratio: f64,
    pub y_range: Option<[f64; 2]>,
    pub traces: Vec<Trace>,
    pub reference_lines: Vec<ReferenceLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub l: u32,
    pub r: u32,
    pub b: u32,
}

/// Figure-wide layout hints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub height: u32,
    pub template: &'static str,
    pub show_legend: bool,
    pub vertical_spacing: f64,
    pub margin: Margin,
    pub drag_mode: &'static str,
    pub drawing_tools: Vec<&'static str>,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            height: 800,
            template: "plotly_dark",
            show_legend: true,
            vertical_spacing: 0.05,
            margin: Margin {
                t: 30,
                l: 50,
                r: 50,
                b: 50,
            },
            drag_mode: "drawline",
            drawing_tools: DRAWING_TOOLS.to_vec(),
        }
    }
}

/// Complete chart description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSpec {
    pub symbol: String,
    /// Shared x axis, RFC 3339 timestamps
    pub x: Vec<String>,
    pub panels: Vec<Panel>,
    pub layout: ChartLayout,
}

impl PlotSpec {
    pub fn panel(&self, title: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.title == title)
    }
}

fn trace(analyzed: &AnalyzedSeries, name: &str, column: Column, color: &'static str) -> Trace {
    Trace {
        name: name.to_string(),
        column,
        color,
        values: analyzed.column(column),
    }
}

/// Arrange price, RSI and MACD panels for an analyzed series
pub fn build_price_chart(analyzed: &AnalyzedSeries) -> PlotSpec {
    let x = analyzed
        .series
        .timestamps()
        .iter()
        .map(chrono::DateTime::to_rfc3339)
        .collect();

    let price = Panel {
        title: PRICE_PANEL_TITLE,
        y_axis_title: "Price (₹)",
        height_ratio: 0.5,
        y_range: None,
        traces: vec![
            trace(analyzed, "Price", Column::Close, "#ffffff"),
            trace(analyzed, "MA20", Column::Ma20, "#f6c85f"),
            trace(analyzed, "MA50", Column::Ma50, "#8f5fe8"),
            trace(analyzed, "MA200", Column::Ma200, "#4ecdc4"),
        ],
        reference_lines: Vec::new(),
    };

    let rsi = Panel {
        title: RSI_PANEL_TITLE,
        y_axis_title: "RSI",
        height_ratio: 0.25,
        y_range: Some([0.0, 100.0]),
        traces: vec![trace(analyzed, "RSI", Column::Rsi, "#f6c85f")],
        reference_lines: vec![
            ReferenceLine {
                y: RSI_OVERBOUGHT,
                color: "#ff4b4b",
                dash: "dash",
            },
            ReferenceLine {
                y: RSI_OVERSOLD,
                color: "#00ff7f",
                dash: "dash",
            },
        ],
    };

    let macd = Panel {
        title: MACD_PANEL_TITLE,
        y_axis_title: "MACD",
        height_ratio: 0.25,
        y_range: None,
        traces: vec![
            trace(analyzed, "MACD", Column::Macd, "#4ecdc4"),
            trace(analyzed, "Signal Line", Column::SignalLine, "#f6c85f"),
        ],
        reference_lines: Vec::new(),
    };

    PlotSpec {
        symbol: analyzed.series.symbol().to_string(),
        x,
        panels: vec![price, rsi, macd],
        layout: ChartLayout::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::analyze;
    use crate::series::fixtures::series_from_closes;

    fn spec(n: usize) -> PlotSpec {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i % 7) as f64).collect();
        build_price_chart(&analyze(series_from_closes("TCS.NS", &closes)).unwrap())
    }

    #[test]
    fn test_three_panels_in_order() {
        let spec = spec(40);
        let titles: Vec<_> = spec.panels.iter().map(|p| p.title).collect();
        assert_eq!(titles, vec![PRICE_PANEL_TITLE, RSI_PANEL_TITLE, MACD_PANEL_TITLE]);

        let heights: f64 = spec.panels.iter().map(|p| p.height_ratio).sum();
        assert!((heights - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_traces_share_the_x_axis() {
        let spec = spec(40);
        assert_eq!(spec.x.len(), 40);
        for panel in &spec.panels {
            for trace in &panel.traces {
                assert_eq!(trace.values.len(), spec.x.len(), "{}", trace.name);
            }
        }
    }

    #[test]
    fn test_price_panel_overlays_moving_averages() {
        let spec = spec(40);
        let price = spec.panel(PRICE_PANEL_TITLE).unwrap();
        let columns: Vec<_> = price.traces.iter().map(|t| t.column).collect();
        assert_eq!(
            columns,
            vec![Column::Close, Column::Ma20, Column::Ma50, Column::Ma200]
        );
        assert!(price.traces[2].values.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_panel_reference_lines() {
        let spec = spec(40);
        let rsi = spec.panel(RSI_PANEL_TITLE).unwrap();
        let levels: Vec<_> = rsi.reference_lines.iter().map(|l| l.y).collect();
        assert_eq!(levels, vec![70.0, 30.0]);
        assert_eq!(rsi.y_range, Some([0.0, 100.0]));
    }

    #[test]
    fn test_serializes_undefined_points_as_null() {
        let spec = spec(25);
        let json = serde_json::to_value(&spec).unwrap();
        let ma20 = &json["panels"][0]["traces"][1];
        assert_eq!(ma20["column"], "MA20");
        assert!(ma20["values"][0].is_null());
        assert!(ma20["values"][19].is_number());
        assert_eq!(json["layout"]["drawing_tools"][5], "eraseshape");
    }
}
