//! Stock dashboard CLI
//!
//! # Usage
//!
//! ```bash
//! # Optional: enables the news section
//! export NEWS_API_KEY="your-newsapi-key"
//!
//! # Web dashboard on http://127.0.0.1:8501
//! cargo run --bin stock-dash -- serve
//!
//! # One lookup in the terminal, refreshed every STOCK_DASH_REFRESH_SECS
//! cargo run --bin stock-dash -- show RELIANCE --exchange NSE --watch
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use stock_dash::api::{NewsApiClient, YahooFinanceClient};
use stock_dash::refresh::refresh_until;
use stock_dash::terminal::render_view;
use stock_dash::web::{AppState, serve};
use stock_dash::{Dashboard, DashboardConfig, DashboardSession, Exchange, Interval, LookupRequest};

#[derive(Parser)]
#[command(name = "stock-dash")]
#[command(about = "Indian stock market dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web dashboard
    Serve {
        /// Address to bind (overrides STOCK_DASH_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print one lookup to the terminal
    Show {
        /// Stock symbol, e.g. RELIANCE or TCS.NS
        symbol: String,
        /// NSE or BSE
        #[arg(long)]
        exchange: Option<Exchange>,
        /// First day of history (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of history, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Bar interval: 1d, 1h, 15m or 5m
        #[arg(long, default_value = "1d")]
        interval: Interval,
        /// Re-run the lookup on the refresh interval until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
}

fn build_dashboard(config: DashboardConfig) -> anyhow::Result<Dashboard> {
    let market = YahooFinanceClient::new(config.request_timeout)?;
    let news = NewsApiClient::new(
        config.news_api_key.clone(),
        config.news_rate_limit,
        config.request_timeout,
    )?;
    if config.news_api_key.is_none() {
        tracing::warn!("NEWS_API_KEY not set, news section will be empty");
    }
    Ok(Dashboard::new(Arc::new(market), Arc::new(news), config))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app = dash_utils::Config::from_env();
    dash_utils::init_tracing_with(app.log_format);
    tracing::debug!(app = %app.app_name, environment = %app.environment, "Starting");

    let config = DashboardConfig::from_env()?;

    match cli.command {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            let state = Arc::new(AppState::new(build_dashboard(config)?)?);
            serve(state, addr, shutdown_signal()).await?;
            tracing::info!("Dashboard stopped");
        }
        Commands::Show {
            symbol,
            exchange,
            start,
            end,
            interval,
            watch,
        } => {
            let mut request = LookupRequest::new(symbol, exchange.unwrap_or(config.default_exchange))
                .interval(interval);
            request.start = start;
            request.end = end;

            let refresh_every = config.refresh_interval;
            let dashboard = build_dashboard(config)?;
            let session = DashboardSession::new();

            if watch {
                let (dashboard, request, session) = (&dashboard, &request, &session);
                refresh_until(refresh_every, shutdown_signal(), move |_| async move {
                    let view = dashboard.lookup(request, session).await;
                    println!("{}", render_view(&view));
                })
                .await;
            } else {
                let view = dashboard.lookup(&request, &session).await;
                println!("{}", render_view(&view));
            }
        }
    }

    Ok(())
}
