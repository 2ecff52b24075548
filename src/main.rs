//! ANT+ Metrics Agent CLI
//!
//! Relays live ride sensor metrics to a remote collector.

use ant_metrics_agent::{
    build_suite,
    config::{Config, DeviceKind},
    core::{
        create_shared_metrics, install_interrupt_handler, run, start_monitor, ShutdownController,
    },
    stats::create_shared_stats,
    Reporter, VERSION,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::tick;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ant-metrics")]
#[command(version = VERSION)]
#[command(about = "Relays live ANT+ ride sensor metrics to a remote collector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start reading sensors and reporting metrics
    Start {
        /// Device backend to drive
        #[arg(long, value_enum)]
        device: Option<DeviceKind>,

        /// Collector endpoint (overrides the config file)
        #[arg(long)]
        endpoint: Option<String>,

        /// Report interval in seconds (overrides the config file)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start {
            device,
            endpoint,
            interval,
        } => cmd_start(device, endpoint, interval),
        Commands::Init => cmd_init(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(
    device: Option<DeviceKind>,
    endpoint: Option<String>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = Config::load().context("loading configuration")?;
    if let Some(device) = device {
        config.device = device;
    }
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    if let Some(secs) = interval {
        config.report_interval = Duration::from_secs(secs);
    }
    config.validate().context("validating configuration")?;

    tracing::info!(
        version = VERSION,
        endpoint = %config.endpoint,
        interval_secs = config.report_interval.as_secs(),
        device = ?config.device,
        "starting ant-metrics agent"
    );

    let signals = install_interrupt_handler().context("installing Ctrl+C handler")?;

    let metrics = create_shared_metrics();
    let stats = create_shared_stats();
    let reporter =
        Reporter::new(config.gateway(), stats.clone()).context("creating gateway reporter")?;

    let suite = build_suite(&config);
    let monitor = start_monitor(
        &suite,
        metrics.clone(),
        stats.clone(),
        config.heart_rate_sensor_id,
    );
    let mut shutdown = ShutdownController::new(monitor.session.clone());

    let ticker = tick(config.report_interval);
    let code = run(&signals, &ticker, &metrics, &reporter, &mut shutdown);
    println!("{}", stats.summary());
    std::process::exit(code);
}

fn cmd_init() -> anyhow::Result<()> {
    let path = Config::config_path();
    if path.exists() {
        println!("Config file already exists: {path:?}");
        return Ok(());
    }
    Config::default().save().context("saving configuration")?;
    println!("Wrote default configuration to {path:?}");
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
