//! The expiry reaper (spec.md §4.4): a periodic background task that
//! proactively evicts expired keys so they don't linger purely on lazy
//! (read-time) expiration. Mirrors Redis's active-expiration cycle: sample a
//! handful of keys that carry a TTL, evict the ones already expired, and if
//! a large fraction of the sample was expired, assume there's more work and
//! repeat within the same tick (bounded, so one tick can't run forever).

use crate::db::Db;
use crate::metrics::EXPIRED_KEYS;

use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(100);
const SAMPLE_SIZE: usize = 20;
const REPEAT_THRESHOLD: f64 = 0.25;
const MAX_ITERATIONS_PER_TICK: usize = 16;

/// Spawns the reaper as a background Tokio task. Runs until the process
/// exits; there is no graceful-shutdown handshake for it (spec.md does not
/// require one — unlike client connections, the reaper has no in-flight
/// client-visible state to drain).
pub fn spawn(db: Db) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PERIOD);
        loop {
            interval.tick().await;
            run_cycle(&db);
        }
    });
}

fn run_cycle(db: &Db) {
    let database_count = db.database_count();
    for index in 0..database_count {
        for _ in 0..MAX_ITERATIONS_PER_TICK {
            let expired_fraction = reap_one_pass(db, index);
            if expired_fraction <= REPEAT_THRESHOLD {
                break;
            }
        }
    }
}

/// Samples up to `SAMPLE_SIZE` keys carrying a TTL in database `index`,
/// evicts the ones already expired, and returns the fraction of the sample
/// that was expired (used to decide whether to repeat this tick).
fn reap_one_pass(db: &Db, index: usize) -> f64 {
    let mut guard = db.lock();
    let now = guard.now_ms();
    let sample = guard.keys_with_expiry_sample(index, SAMPLE_SIZE);
    if sample.is_empty() {
        return 0.0;
    }

    let mut expired_count = 0u64;
    for (key, expire_at) in &sample {
        if *expire_at <= now && guard.delete(index, key) {
            expired_count += 1;
        }
    }
    if expired_count > 0 {
        EXPIRED_KEYS.inc_by(expired_count);
    }

    expired_count as f64 / sample.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;
    use bytes::Bytes;

    #[test]
    fn reaps_expired_keys_and_reports_expired_fraction() {
        let db = Db::new(1);
        {
            let mut g = db.lock();
            let now = g.now_ms();
            for i in 0..5 {
                let key = Bytes::from(format!("k{i}"));
                g.put(0, key.clone(), Value::String(Bytes::from_static(b"v")));
                g.set_expiry(0, &key, now - 1);
            }
            g.put(
                0,
                Bytes::from_static(b"fresh"),
                Value::String(Bytes::from_static(b"v")),
            );
        }

        let fraction = reap_one_pass(&db, 0);
        assert_eq!(fraction, 1.0);

        let mut g = db.lock();
        assert_eq!(g.size(0), 1);
        assert!(g.get(0, b"fresh").is_some());
    }
}
