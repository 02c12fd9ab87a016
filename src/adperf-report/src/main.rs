//! AdPerf Report, the advertising performance report generator.
//!
//! Main entry point that loads the CSV exports, aggregates them, and
//! writes the XLSX report.

use adperf_analytics::{filter_business_records, filter_campaign_records, ReportTables};
use adperf_core::{PortfolioType, ReportConfig, ReportError};
use adperf_ingest::{load_business_csv, load_campaign_csv};
use adperf_render::WorkbookRenderer;
use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "adperf-report")]
#[command(about = "Advertising performance report generator")]
#[command(version)]
struct Cli {
    /// Campaign report CSV (overrides config)
    #[arg(long, env = "ADPERF__CAMPAIGN_FILE")]
    campaign: Option<String>,

    /// Business report CSV, enables organic/TACOS analysis (overrides config)
    #[arg(long, env = "ADPERF__BUSINESS_FILE")]
    business: Option<String>,

    /// Output XLSX path (overrides config)
    #[arg(long, env = "ADPERF__OUTPUT_FILE")]
    out: Option<String>,

    /// Only include rows on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date)]
    from: Option<NaiveDate>,

    /// Only include rows on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date)]
    to: Option<NaiveDate>,

    /// Restrict the report to one portfolio type (JN or Non-JN)
    #[arg(long)]
    portfolio: Option<PortfolioType>,

    /// Dump the aggregated tables as JSON to stdout instead of rendering
    #[arg(long, default_value_t = false)]
    dump_tables: bool,
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("invalid date '{raw}': {e}"))
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adperf=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = ReportConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ReportConfig::default()
    });

    // Apply CLI overrides
    if let Some(campaign) = cli.campaign {
        config.campaign_file = campaign;
    }
    if let Some(business) = cli.business {
        config.business_file = Some(business);
    }
    if let Some(out) = cli.out {
        config.output_file = out;
    }
    if cli.from.is_some() {
        config.date_from = cli.from;
    }
    if cli.to.is_some() {
        config.date_to = cli.to;
    }
    if cli.portfolio.is_some() {
        config.portfolio_filter = cli.portfolio;
    }

    info!(
        campaign = %config.campaign_file,
        business = config.business_file.as_deref().unwrap_or("<none>"),
        output = %config.output_file,
        "Configuration loaded"
    );

    let campaign_load = load_campaign_csv(&config.campaign_file, &config)?;
    let records = filter_campaign_records(campaign_load.records, &config);
    if records.is_empty() {
        anyhow::bail!("no campaign rows left after filtering, nothing to report");
    }

    // A missing business export is not fatal; the report degrades to
    // ad-only metrics.
    let business = match &config.business_file {
        Some(path) => match load_business_csv(path, &config) {
            Ok(load) => Some(filter_business_records(load.records, &config)),
            Err(ReportError::InputMissing(file)) => {
                warn!(file = %file, "Business export not found, TACOS and organic outputs disabled");
                None
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let tables = ReportTables::build(&records, business.as_deref());

    if cli.dump_tables {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    let renderer = WorkbookRenderer::new(config.raw_sheet_row_cap);
    let bytes = renderer.render_to_bytes(&tables, &records, business.as_deref())?;
    std::fs::write(&config.output_file, &bytes)?;

    info!(
        output = %config.output_file,
        rows = records.len(),
        "Report written"
    );

    Ok(())
}
