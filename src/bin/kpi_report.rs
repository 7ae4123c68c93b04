//! KPI report CLI.
//!
//! Queries Prometheus for a reporting window and prints a plain-text
//! summary. The window is either a calendar month (`--month 2026-01`) or an
//! explicit date pair (`kpi-report 2026-01-01 2026-01-31`).

use clap::Parser;
use reqwest::Url;

use webui_kpi::report::{self, client::PromClient, window};

const DEFAULT_PROMETHEUS_URL: &str = "http://otel-backend:9090";

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a KPI report from Prometheus metrics")]
struct Args {
    /// Report start date (YYYY-MM-DD)
    start_date: Option<String>,

    /// Report end date (YYYY-MM-DD), inclusive
    end_date: Option<String>,

    /// Report a whole calendar month (YYYY-MM) instead of a date pair
    #[arg(short, long, conflicts_with_all = ["start_date", "end_date"])]
    month: Option<String>,

    /// Prometheus base URL
    #[arg(short, long, env = "PROMETHEUS_URL", default_value = DEFAULT_PROMETHEUS_URL)]
    prometheus: Url,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    webui_kpi::telemetry::init_tracing()?;

    let now = chrono::Utc::now();
    let window = window::resolve_window(
        args.month.as_deref(),
        args.start_date.as_deref(),
        args.end_date.as_deref(),
        now,
    )?;

    println!(
        "Generating KPI report for {} to {}...",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d")
    );
    println!("Prometheus: {}", args.prometheus);

    let client = PromClient::new(args.prometheus)?;
    let report = report::generate(&client, &window).await;
    print!("{}", report.render());

    Ok(())
}
