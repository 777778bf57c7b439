//! Server-rendered dashboard page

use chrono::NaiveDate;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::chart::DRAWING_TOOLS;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::market::{Exchange, Interval, days_before};

const TEMPLATE_NAME: &str = "dashboard.html";
const TEMPLATE: &str = include_str!("../../templates/dashboard.html");

#[derive(Debug, Serialize)]
struct Choice {
    value: &'static str,
    selected: bool,
}

/// Renders the dashboard shell; data is loaded by the page from `/api/lookup`
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the page with sidebar defaults as of `today`
    pub fn render(&self, config: &DashboardConfig, today: NaiveDate) -> Result<String> {
        let exchanges: Vec<Choice> = Exchange::ALL
            .iter()
            .map(|e| Choice {
                value: e.code(),
                selected: *e == config.default_exchange,
            })
            .collect();
        let intervals: Vec<Choice> = Interval::ALL
            .iter()
            .map(|i| Choice {
                value: i.as_str(),
                selected: *i == Interval::default(),
            })
            .collect();
        let default_start = days_before(today, config.default_history_days)?;

        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(context! {
            refresh_secs => config.refresh_interval.as_secs(),
            exchanges => exchanges,
            intervals => intervals,
            default_start => default_start.to_string(),
            default_end => today.to_string(),
            drawing_tools => DRAWING_TOOLS,
        })?)
    }
}
