use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shipment_kpi::{KpiClient, ReportConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kpi_report")]
#[command(about = "Print weekly/monthly shipment KPIs as JSON")]
struct Args {
    /// DuckDB warehouse file
    #[arg(long, global = true, default_value = "data/warehouse.duckdb")]
    db: PathBuf,

    /// Optional JSON report config (year bounds, UTC offset, tail policy)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Weekly rows for a month compared with the month before
    Monthly {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
    },
    /// Aggregates for an inclusive date range (YYYY-MM-DD)
    Window {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ReportConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ReportConfig::default(),
    };

    info!("Opening warehouse at {}", args.db.display());
    let client = KpiClient::builder()
        .database(&args.db)
        .config(config)
        .build()
        .context("opening warehouse")?;

    let json = match args.command {
        Command::Monthly { month, year } => {
            let report = client.monthly_report(month, year)?;
            info!(
                "{}-{:02}: {} weeks, prior month {} weeks",
                year,
                month,
                report.current.rows.len(),
                report.prior.rows.len()
            );
            serde_json::to_string_pretty(&report)?
        }
        Command::Window { start, end } => {
            let report = client.window_report(start, end)?;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{json}");
    Ok(())
}
