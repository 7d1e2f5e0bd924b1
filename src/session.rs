//! Per-connection session state (spec.md §3: "Client session state (not
//! persisted)"). Not shared across connections and not protected by the
//! keyspace mutex; each `Handler` owns exactly one `Session`.

use crate::frame::Frame;
use std::collections::HashSet;

/// One queued command inside a `MULTI`/`EXEC` block: the original request
/// frame, re-parsed and re-applied when `EXEC` runs.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub frame: Frame,
}

#[derive(Debug)]
pub struct Session {
    /// Opaque id used by the pub/sub hub and `CLIENT`/`PUBSUB` introspection.
    pub id: u64,

    /// Current database index, mutable via SELECT.
    pub db_index: usize,

    /// Exact-channel subscriptions.
    pub channels: HashSet<String>,

    /// Pattern subscriptions.
    pub patterns: HashSet<String>,

    /// `true` once MULTI has been issued and EXEC/DISCARD has not yet run.
    pub in_multi: bool,

    /// Set when a command fails to parse/validate while queuing; causes
    /// EXEC to abort without running anything (spec.md §9 Open Question).
    pub multi_dirty: bool,

    /// Commands queued since MULTI.
    pub queued: Vec<QueuedCommand>,

    /// Trivially-authenticated flag (spec.md: AUTH is a no-op in this
    /// implementation; kept so CLIENT/INFO can report something plausible).
    pub authenticated: bool,
}

impl Session {
    pub fn new(id: u64) -> Session {
        Session {
            id,
            db_index: 0,
            channels: HashSet::new(),
            patterns: HashSet::new(),
            in_multi: false,
            multi_dirty: false,
            queued: Vec::new(),
            authenticated: true,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        !self.channels.is_empty() || !self.patterns.is_empty()
    }

    pub fn subscription_count(&self) -> i64 {
        (self.channels.len() + self.patterns.len()) as i64
    }

    pub fn start_multi(&mut self) {
        self.in_multi = true;
        self.multi_dirty = false;
        self.queued.clear();
    }

    pub fn discard_multi(&mut self) {
        self.in_multi = false;
        self.multi_dirty = false;
        self.queued.clear();
    }

    pub fn queue(&mut self, frame: Frame) {
        self.queued.push(QueuedCommand { frame });
    }
}
