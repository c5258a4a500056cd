//! Promdash - Grafana dashboards from Prometheus metrics
//!
//! Reads Prometheus text exposition from a file or stdin and writes a
//! dashboard document as JSON.
//!
//! Usage:
//!   promdash [OPTIONS] [INPUT]
//!
//! Configuration:
//!   Optional TOML, YAML or JSON file; command line flags override its values.
//!   Without a file, defaults and `PROMDASH_*` environment variables apply.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promdash::{
    parse_exposition, DashboardAssembler, DashboardSubmission, Ingestor, PromdashConfig,
};

/// Promdash - Grafana dashboards from Prometheus metrics
#[derive(Parser, Debug)]
#[command(
    name = "promdash",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate a Grafana dashboard from Prometheus metrics",
    long_about = "Classifies every metric in a Prometheus text exposition document and \
lays out one panel per metric on a Grafana dashboard, optionally grouped by label or vendor."
)]
struct Args {
    /// Exposition input file, `-` or absent for stdin
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to a TOML, YAML or JSON configuration file"
    )]
    config: Option<PathBuf>,

    /// Dashboard title
    #[arg(short, long, value_name = "TITLE", help = "Dashboard title")]
    title: Option<String>,

    /// Output file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Write the dashboard to FILE instead of stdout"
    )]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(short, long, help = "Pretty-print the JSON output")]
    pretty: bool,

    /// Render gauges with the gauge widget
    #[arg(short, long, help = "Render gauge metrics with the gauge widget")]
    gauges: bool,

    /// Attach heuristic alerts
    #[arg(short, long, help = "Attach heuristic alerts to matching panels")]
    alerts: bool,

    /// Vendor detection and grouping
    #[arg(long, help = "Detect vendor prefixes and group panels by vendor")]
    vendor: bool,

    /// Wrap in a submission payload
    #[arg(
        short,
        long,
        help = "Wrap the dashboard in a create-or-update submission payload"
    )]
    submission: bool,

    /// Log level
    #[arg(
        short = 'l',
        long,
        value_name = "LEVEL",
        help = "Log level (trace, debug, info, warn, error)",
        default_value = "warn"
    )]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();

    let mut config = load_config(&args)?;
    apply_cli_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    let text = read_input(args.input.as_ref())?;

    let mut ingestor = Ingestor::new(&config.vendor);
    let mut rejected = 0;
    for entry in parse_exposition(&text) {
        match entry {
            Ok(entry) => {
                if let Err(e) = ingestor.ingest(entry) {
                    warn!("Skipping entry: {}", e);
                    rejected += 1;
                }
            }
            Err(e) => {
                warn!("Skipping line: {}", e);
                rejected += 1;
            }
        }
    }
    let registry = ingestor.finish();
    info!(metrics = registry.len(), rejected, "Metrics ingested");

    let dashboard = DashboardAssembler::new(&config).assemble(&registry);
    let json = if args.submission {
        DashboardSubmission::new(dashboard).to_json(args.pretty)?
    } else {
        dashboard.to_json(args.pretty)?
    };

    write_output(args.output.as_ref(), &json)
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> Result<PromdashConfig> {
    match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            PromdashConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))
        }
        None => PromdashConfig::from_env().context("Invalid environment configuration"),
    }
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut PromdashConfig, args: &Args) {
    if let Some(title) = &args.title {
        config.dashboard.title = title.clone();
    }
    if args.gauges {
        config.visualization.gauges = true;
    }
    if args.alerts {
        config.alerts.enabled = true;
    }
    if args.vendor {
        config.vendor.enabled = true;
        config.vendor.group_by_vendor = true;
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read metrics from {:?}", path)),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read metrics from stdin")?;
            Ok(text)
        }
    }
}

fn write_output(output: Option<&PathBuf>, json: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write dashboard to {:?}", path))?;
            info!("Dashboard written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write dashboard")?;
        }
    }
    Ok(())
}
