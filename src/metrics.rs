//! Process metrics, exposed over a tiny `hyper` HTTP endpoint (SPEC_FULL.md
//! §1 ambient stack). Trimmed down from the teacher's much larger
//! `metrics/` module to the handful of series this service actually has
//! something to say about.

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, TextEncoder};
use std::net::SocketAddr;

lazy_static! {
    pub static ref CONNECTED_CLIENTS: IntGauge =
        prometheus::register_int_gauge!("duskdb_connected_clients", "current client connections")
            .unwrap();
    pub static ref COMMANDS_PROCESSED: IntCounter = prometheus::register_int_counter!(
        "duskdb_commands_processed_total",
        "commands successfully applied"
    )
    .unwrap();
    pub static ref COMMAND_ERRORS: IntCounterVec = prometheus::register_int_counter_vec!(
        "duskdb_command_errors_total",
        "commands that returned an error reply",
        &["command"]
    )
    .unwrap();
    pub static ref EXPIRED_KEYS: IntCounter = prometheus::register_int_counter!(
        "duskdb_expired_keys_total",
        "keys evicted by the active expiry reaper"
    )
    .unwrap();
    pub static ref SNAPSHOT_DURATION_MS: IntGauge = prometheus::register_int_gauge!(
        "duskdb_last_snapshot_duration_ms",
        "wall time of the most recently completed snapshot, in milliseconds"
    )
    .unwrap();
}

async fn serve(_req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    Ok(Response::new(Body::from(buffer)))
}

/// Starts the `/metrics` HTTP endpoint in the background. Errors (e.g. the
/// port is already bound) are logged and otherwise non-fatal: the key-value
/// server itself does not depend on metrics being reachable.
pub fn spawn(addr: SocketAddr) {
    tokio::spawn(async move {
        let make_svc =
            make_service_fn(|_conn| async { Ok::<_, hyper::Error>(service_fn(serve)) });
        if let Err(err) = Server::bind(&addr).serve(make_svc).await {
            tracing::error!(%err, "metrics server exited");
        }
    });
}
