//! `duskdb-server`: binds the TCP listener, loads the on-disk snapshot (if
//! any), and drives the server until SIGTERM/SIGINT or a client-issued
//! SHUTDOWN (spec.md §6 "CLI surface of the server process").

use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use duskdb::cmd;
use duskdb::config::{self, Cli};
use duskdb::db::Db;
use duskdb::hub::Hub;
use duskdb::{metrics, reaper, server, snapshot};

#[tokio::main]
pub async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.loglevel);

    let databases = cli.databases;
    let dbfilename = cli.dbfilename.clone();
    let bind_addr = cli.bind_addr();
    let metrics_addr = cli.metrics_socket_addr();
    config::set_global_config(cli);

    let db = Db::new(databases);
    snapshot::restore_at_boot(&db, &PathBuf::from(&dbfilename));

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %bind_addr, "failed to bind");
            exit(1);
        }
    };

    cmd::admin::record_start_time();
    reaper::spawn(db.clone());
    snapshot::spawn_periodic(db.clone(), config::snapshot_interval());
    if let Some(addr) = metrics_addr {
        metrics::spawn(addr);
    }

    info!(addr = %bind_addr, databases, "duskdb listening");
    let hub = Hub::new();
    server::run(listener, db, hub, shutdown_signal()).await;

    exit(0);
}

/// Resolves once either a client SHUTDOWN/SIGTERM-equivalent broadcast fires
/// inside `server::run`'s own `tokio::select!`, or the process receives
/// SIGINT/SIGTERM directly — whichever comes first.
async fn shutdown_signal() {
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
}

fn init_tracing(loglevel: &str) {
    let directive = match loglevel.to_lowercase().as_str() {
        "debug" => "debug",
        "warning" | "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| directive.into()))
        .init();
}
