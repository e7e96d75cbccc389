// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk — local print agent.
//
// Entry point. Initialises logging, builds the platform dispatcher once,
// and runs the job router until interrupted.

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use spoolwerk_core::config::AgentConfig;
use spoolwerk_print::platform_dispatcher;

use server::JobServer;

#[derive(Debug, Parser)]
#[command(name = "spoolwerk-agent", version, about = "Local print agent")]
struct Args {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AgentConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("spoolwerk-agent: failed to load config: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    let listen_addr = args.listen.unwrap_or(config.listen_addr);
    info!(addr = %listen_addr, "spoolwerk agent starting");

    // One strategy for the process lifetime, selected by host identity.
    let dispatcher = Arc::new(platform_dispatcher());

    let mut router = JobServer::new(listen_addr);
    if let Err(e) = router.start(dispatcher).await {
        error!(error = %e, "failed to start job router");
        std::process::exit(1);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }

    info!("shutdown signal received");
    if let Err(e) = router.stop().await {
        error!(error = %e, "error during shutdown");
    }
}
