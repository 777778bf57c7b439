//! Plain-text rendering of a dashboard view for the terminal

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::fmt::Write;

use crate::company::NOT_AVAILABLE;
use crate::dashboard::{DashboardView, NO_NEWS_MESSAGE, StockView};
use crate::indicators::{Column, interpret_rsi};

const SNAPSHOT_COLUMNS: [Column; 9] = [
    Column::Ma20,
    Column::Ma50,
    Column::Ma200,
    Column::Rsi,
    Column::Macd,
    Column::SignalLine,
    Column::BbUpper,
    Column::BbMiddle,
    Column::BbLower,
];

fn new_table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Render any view as text
pub fn render_view(view: &DashboardView) -> String {
    match view {
        DashboardView::Prompt { message } | DashboardView::NotFound { message, .. } => {
            format!("{message}\n")
        }
        DashboardView::Loaded(stock) => render_stock(stock),
    }
}

/// Latest value of every indicator column
pub fn indicator_table(stock: &StockView) -> Table {
    let mut table = new_table(["Indicator", "Latest"]);
    for column in SNAPSHOT_COLUMNS {
        let latest = stock.analyzed.column(column).last().copied().flatten();
        let value = match (column, latest) {
            (Column::Rsi, Some(v)) => format!("{v:.2} ({})", interpret_rsi(v)),
            (_, Some(v)) => format!("{v:.2}"),
            (_, None) => NOT_AVAILABLE.to_string(),
        };
        table.add_row(vec![column.name().to_string(), value]);
    }
    table
}

fn render_stock(stock: &StockView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", stock.title);
    let _ = write!(out, "Current Price: {}", stock.price.price_display);
    if let Some(change) = &stock.price.change_display {
        let _ = write!(out, " ({change})");
    }
    if stock.in_watchlist {
        out.push_str("  [watchlist]");
    }
    out.push_str("\n\n");

    let _ = writeln!(out, "{}\n", indicator_table(stock));

    if !stock.company_info.is_empty() {
        let mut info = new_table(["Company Information", ""]);
        for field in &stock.company_info {
            info.add_row(vec![field.label.to_string(), field.value.clone()]);
        }
        let _ = writeln!(out, "{info}\n");
    }

    if stock.news.is_empty() {
        let _ = writeln!(out, "{NO_NEWS_MESSAGE}");
    } else {
        let mut news = new_table(["Latest News", "Source"]);
        for item in &stock.news {
            news.add_row(vec![item.headline.clone(), item.source.clone()]);
        }
        let _ = writeln!(out, "{news}");
    }

    out
}
