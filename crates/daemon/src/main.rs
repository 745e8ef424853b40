// SPDX-License-Identifier: MIT

//! `daq-daemon`: boots the DAQ control & streaming-graph engine, runs its
//! optional startup batch script (spec §4.6), then serves until signalled
//! to shut down.
//!
//! The AMQP request bus and chat relayer are external collaborators (spec
//! §1) this binary does not implement; the batch executor is the only
//! built-in way to drive the controller without one.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use daq_daemon::config::DaemonConfig;
use daq_daemon::wiring;
use daq_engine::{BatchExecutor, BatchOutcome};

#[derive(Parser, Debug)]
#[command(name = "daq-daemon")]
#[command(about = "DAQ control & streaming-graph engine daemon", long_about = None)]
struct Args {
    /// Path to the daemon's TOML configuration file.
    #[arg(short, long, default_value = "daq-daemon.toml")]
    config: PathBuf,

    /// Enable verbose (debug) logging, overriding `RUST_LOG`.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match DaemonConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "failed to load daemon config");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(config = %args.config.display(), "daq-daemon starting");
    let (controller, _registry) = wiring::build_controller(&config);
    controller.execute();

    if !config.batch.is_empty() {
        let executor = BatchExecutor::new();
        match executor.run(&config.batch, &controller).await {
            BatchOutcome::QuitRequested => {
                tracing::info!("batch script requested quit, shutting down");
                let _ = controller.cancel().await;
                return ExitCode::SUCCESS;
            }
            BatchOutcome::Completed => {
                tracing::info!("batch script completed, now serving until signalled");
            }
        }
    }

    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler, shutting down immediately");
    }
    tracing::info!("shutdown requested, cancelling controller");
    let _ = controller.cancel().await;
    ExitCode::SUCCESS
}
