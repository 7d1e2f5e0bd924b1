use crate::cmd::Context;
use crate::db::Db;
use crate::utils::resp_ok;
use crate::Frame;

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_SAVE: AtomicI64 = AtomicI64::new(0);

fn snapshot_path() -> PathBuf {
    PathBuf::from(crate::config::config_dbfilename_or_default())
}

fn save_dbs(db: &Db) -> std::io::Result<()> {
    let dbs = db.lock().snapshot_clone();
    let started = std::time::Instant::now();
    crate::snapshot::save(&dbs, &snapshot_path())?;
    crate::metrics::SNAPSHOT_DURATION_MS.set(started.elapsed().as_millis() as i64);
    LAST_SAVE.store(crate::utils::now_timestamp_in_millis() / 1000, Ordering::Relaxed);
    super::admin::reset_dirty_count();
    Ok(())
}

/// `SAVE`'s own path: holds the keyspace lock for the full serialization
/// (spec.md §5 — unlike BGSAVE, which clones under the lock and serializes
/// the clone afterwards).
fn save_dbs_locked(db: &Db) -> std::io::Result<()> {
    let guard = db.lock();
    let started = std::time::Instant::now();
    let result = crate::snapshot::save(guard.databases(), &snapshot_path());
    drop(guard);
    result?;
    crate::metrics::SNAPSHOT_DURATION_MS.set(started.elapsed().as_millis() as i64);
    LAST_SAVE.store(crate::utils::now_timestamp_in_millis() / 1000, Ordering::Relaxed);
    super::admin::reset_dirty_count();
    Ok(())
}

/// Called from the background snapshot task (spec.md §4.7: "every T seconds
/// if at least K keys changed"). Saves only if the dirty-key count since the
/// last save has crossed `config::snapshot_dirty_threshold()`; a no-op tick
/// otherwise. Returns whether a save actually ran.
pub fn maybe_periodic_save(db: &Db) -> std::io::Result<bool> {
    if super::admin::dirty_count() < crate::config::snapshot_dirty_threshold() {
        return Ok(false);
    }
    save_dbs(db)?;
    Ok(true)
}

/// `SAVE`: serializes the keyspace synchronously, blocking the caller until
/// the file is written.
#[derive(Debug)]
pub struct Save;

impl Save {
    pub(crate) fn parse_frames(_parse: &mut crate::parse::Parse) -> crate::Result<Save> {
        Ok(Save)
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        match save_dbs_locked(ctx.db) {
            Ok(()) => resp_ok(),
            Err(err) => Frame::Error(format!("ERR {err}")),
        }
    }
}

/// `BGSAVE`. There is no background-fork to distinguish, so this saves
/// synchronously as well and reports the fixed "started" message real Redis
/// returns immediately, rather than claiming asynchronous work that isn't
/// actually happening. Unlike `SAVE`, it clones the keyspace under the lock
/// and releases the lock before serializing the clone (spec.md §5).
#[derive(Debug)]
pub struct Bgsave;

impl Bgsave {
    pub(crate) fn parse_frames(_parse: &mut crate::parse::Parse) -> crate::Result<Bgsave> {
        Ok(Bgsave)
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        match save_dbs(ctx.db) {
            Ok(()) => Frame::Simple("Background saving started".to_string()),
            Err(err) => Frame::Error(format!("ERR {err}")),
        }
    }
}

/// `LASTSAVE`.
#[derive(Debug)]
pub struct Lastsave;

impl Lastsave {
    pub(crate) fn parse_frames(_parse: &mut crate::parse::Parse) -> crate::Result<Lastsave> {
        Ok(Lastsave)
    }

    pub(crate) fn apply(&self, _ctx: &mut Context) -> Frame {
        Frame::Integer(LAST_SAVE.load(Ordering::Relaxed))
    }
}
