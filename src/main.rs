use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sales_analysis::{
    shell::{DEFAULT_CHART_HEIGHT, DEFAULT_DATA},
    stats::{SummaryOptions, DEFAULT_COST_RATIO, DEFAULT_INITIAL_STOCK, DEFAULT_WINDOW},
    Credentials, Options, Shell,
};

#[derive(Parser)]
#[command(version, about)]
/// Analyses 30 days of per-item sales from a CSV file, behind a login menu.
///
/// The CSV file must have the columns `Item`, `Category`, `Price` and
/// `Day1` to `Day30`. Other columns are ignored.
struct Args {
    #[arg(long, default_value = DEFAULT_DATA)]
    /// Path to the sales data CSV file
    data: PathBuf,
    #[arg(long, default_value_t = DEFAULT_INITIAL_STOCK)]
    /// Units each item is assumed to start the period with
    initial_stock: i64,
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    /// Moving-average window (in days) for the sales forecast
    window: usize,
    #[arg(long, default_value_t = DEFAULT_COST_RATIO)]
    /// Cost price as a fraction of selling price
    cost_ratio: f64,
    #[arg(long, default_value_t = DEFAULT_CHART_HEIGHT)]
    /// Height of the daily sales charts, in lines
    chart_height: usize,
    #[arg(short, long, action = clap::ArgAction::Count)]
    /// Log more detail to stderr (repeat for more)
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let options = Options {
        data: args.data,
        stats: SummaryOptions {
            initial_stock: args.initial_stock,
            window: args.window,
            cost_ratio: args.cost_ratio,
        },
        chart_height: args.chart_height,
    };
    let data = options.data.display().to_string();
    let mut credentials = Credentials::new();
    let mut shell = Shell::new(io::stdin().lock(), io::stdout().lock(), options);
    shell
        .run(&mut credentials)
        .with_context(|| format!("running sales analysis on {data}"))?;
    Ok(())
}
