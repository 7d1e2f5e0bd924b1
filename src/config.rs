//! Server configuration: a `clap` derive CLI plus a small set of resolved
//! accessors, mirroring the teacher's `config_*_or_default` pattern but
//! backed by the CLI flags this service actually exposes (spec.md §6).

use clap::Parser;
use std::net::SocketAddr;
use std::sync::OnceLock;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_DBFILENAME: &str = "dump.rdb";
pub const DEFAULT_DATABASES: usize = 16;

#[derive(Parser, Debug, Clone)]
#[clap(name = "duskdb-server", version, author, about = "An in-memory RESP key-value store")]
pub struct Cli {
    /// TCP port to listen on.
    #[clap(short = 'p', long, default_value = "6379")]
    pub port: u16,

    /// Address to bind.
    #[clap(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Log verbosity: debug, info, warning, error.
    #[clap(short = 'l', long, default_value = "info")]
    pub loglevel: String,

    /// Path to the snapshot file, loaded at boot and written by SAVE/BGSAVE.
    #[clap(long, default_value = DEFAULT_DBFILENAME)]
    pub dbfilename: String,

    /// Number of numbered databases.
    #[clap(long, default_value = "16")]
    pub databases: usize,

    /// Address for the Prometheus `/metrics` endpoint. Ambient observability,
    /// not part of spec.md's CLI surface; disabled with an empty value.
    #[clap(long, default_value = "127.0.0.1:9121")]
    pub metrics_addr: String,
}

impl Cli {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        if self.metrics_addr.trim().is_empty() {
            return None;
        }
        self.metrics_addr.parse().ok()
    }
}

static CONFIG: OnceLock<Cli> = OnceLock::new();

/// Installs the resolved CLI as the process-wide config. Panics if called
/// twice; `main` calls this exactly once at startup.
pub fn set_global_config(cli: Cli) {
    CONFIG
        .set(cli)
        .expect("set_global_config called more than once");
}

fn global() -> &'static Cli {
    CONFIG.get().expect("config not initialized")
}

pub fn config_port_or_default() -> u16 {
    CONFIG.get().map(|c| c.port).unwrap_or(DEFAULT_PORT)
}

pub fn config_host_or_default() -> String {
    CONFIG
        .get()
        .map(|c| c.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

pub fn config_databases_or_default() -> usize {
    CONFIG.get().map(|c| c.databases).unwrap_or(DEFAULT_DATABASES)
}

pub fn config_dbfilename_or_default() -> String {
    CONFIG
        .get()
        .map(|c| c.dbfilename.clone())
        .unwrap_or_else(|| DEFAULT_DBFILENAME.to_string())
}

/// Number of keys that must change since the last snapshot before the
/// periodic snapshot trigger considers saving again (spec.md §4.7: "every T
/// seconds if at least K keys changed").
pub fn snapshot_dirty_threshold() -> u64 {
    100
}

/// Interval between periodic-snapshot checks (spec.md §4.7).
pub fn snapshot_interval() -> std::time::Duration {
    std::time::Duration::from_secs(300)
}

/// Active-expiry reaper sample size (spec.md §4.4).
pub fn reaper_sample_size() -> usize {
    20
}

pub fn global_cli() -> &'static Cli {
    global()
}
