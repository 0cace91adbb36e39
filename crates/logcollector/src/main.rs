//! Log collector entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info};

use logcollector::{log_routes, Args, SERVER_NAME, VERSION};
use logcollector_server::{wait_for_os_signal, RestServer};

/// How the collector stopped running.
enum Exit {
    Signal,
    Crashed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match logcollector_telemetry::init_logging(&args.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{SERVER_NAME}: failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(Exit::Signal) => {
            info!("{SERVER_NAME} quit");
            ExitCode::SUCCESS
        }
        Ok(Exit::Crashed) => {
            error!("{SERVER_NAME} crashed, quitting");
            ExitCode::FAILURE
        }
        Err(e) => {
            let reason = format!("{e:#}");
            error!(error = %reason, "start {SERVER_NAME} failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<Exit> {
    let mut server = RestServer::new(args.server_config());
    server.add_routes(log_routes());

    let (crash_tx, crash_rx) = oneshot::channel();
    server
        .start(Some(crash_tx))
        .context("server did not start")?;

    match server.local_addr().await {
        Some(addr) => info!(%addr, version = VERSION, "{SERVER_NAME} start successful"),
        None => {
            // The listener failed to bind; its crash notification is pending.
            let _ = server.shutdown().await;
            anyhow::bail!("failed to bind {}", server.config().http_addr());
        }
    }

    tokio::select! {
        signal = wait_for_os_signal() => {
            signal.context("failed to listen for shutdown signals")?;
            server.shutdown().await.context("shutdown failed")?;
            Ok(Exit::Signal)
        }
        _ = crash_rx => {
            // The listener task has already exited.
            let _ = server.shutdown().await;
            Ok(Exit::Crashed)
        }
    }
}
