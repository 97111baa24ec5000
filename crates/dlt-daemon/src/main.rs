//! # DLT Daemon
//!
//! ```bash
//! dlt-daemon --config /etc/dlt.toml --log-level debug
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dlt_daemon::{init_logging, Daemon, DaemonConfig, ExitFlag};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dlt-daemon")]
#[command(about = "Diagnostic log and trace daemon", long_about = None)]
struct Args {
    /// Daemon configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Filter configuration file, overrides the daemon configuration
    #[arg(short, long)]
    filter_config: Option<PathBuf>,

    /// Client TCP port, overrides the daemon configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs).context("Failed to initialise logging")?;

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.filter_config {
        config.filter_config = Some(path);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting dlt-daemon");

    let filter = config.load_filter().context("Failed to build message filter")?;
    let exit = ExitFlag::new();
    exit.install_signal_handler()
        .context("Failed to install signal handler")?;

    let mut daemon = Daemon::new(config, filter, exit).context("Failed to start daemon")?;
    daemon.run().context("Daemon stopped on error")?;
    Ok(())
}
