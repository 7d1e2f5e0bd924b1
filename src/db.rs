//! The keyspace: a numbered collection of databases, each mapping a key to a
//! typed, optionally-expiring value. Concurrency-safe via a single mutex
//! guarding the entire keyspace (see module docs on `Db::lock`).

use crate::zset::SortedSet;

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;

/// The five value kinds a key's entry may hold.
#[derive(Debug, Clone)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
    ZSet(SortedSet),
}

impl Clone for SortedSet {
    fn clone(&self) -> Self {
        let mut copy = SortedSet::new();
        for (member, score) in self.iter() {
            copy.insert(member.clone(), score);
        }
        copy
    }
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
            Value::ZSet(_) => "zset",
        }
    }

    /// Whether this value, if it is a collection, has become empty and must
    /// therefore be deleted rather than left resident (spec.md invariant:
    /// "An empty collection value is not a legal resident entry").
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(l) => l.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::Hash(h) => h.is_empty(),
            Value::ZSet(z) => z.is_empty(),
        }
    }
}

/// A resident key: its value and an optional absolute expiry (ms since
/// epoch).
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Value,
    pub expire_at: Option<i64>,
}

impl Entry {
    pub fn new(value: Value) -> Entry {
        Entry {
            value,
            expire_at: None,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expire_at, Some(at) if at <= now_ms)
    }
}

/// One numbered database's key -> entry mapping. Backed by a `BTreeMap` (not
/// a `HashMap`) specifically so that SCAN-family cursors can be implemented
/// as a deterministic, order-stable snapshot (see `crate::scan::Scanner`).
#[derive(Debug, Default, Clone)]
pub struct Database {
    pub entries: BTreeMap<Bytes, Entry>,
}

impl Database {
    fn get_live(&mut self, key: &[u8], now_ms: i64) -> Option<&Entry> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(now_ms) {
                self.entries.remove(key);
                return None;
            }
        }
        self.entries.get(key)
    }

    fn get_live_mut(&mut self, key: &[u8], now_ms: i64) -> Option<&mut Entry> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(now_ms) {
                self.entries.remove(key);
                return None;
            }
        }
        self.entries.get_mut(key)
    }
}

/// All numbered databases, behind the single keyspace mutex.
#[derive(Debug)]
pub struct Keyspace {
    pub dbs: Vec<Database>,
}

/// A guard over the whole keyspace, held for the duration of one command's
/// execution (spec.md §5: "Held for the duration of one command execution
/// and released before I/O").
pub struct KeyspaceGuard<'a> {
    guard: MutexGuard<'a, Keyspace>,
    now_ms: i64,
}

impl<'a> KeyspaceGuard<'a> {
    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    fn db_mut(&mut self, index: usize) -> &mut Database {
        &mut self.guard.dbs[index]
    }

    pub fn get(&mut self, db: usize, key: &[u8]) -> Option<&Value> {
        let now = self.now_ms;
        self.db_mut(db).get_live(key, now).map(|e| &e.value)
    }

    pub fn get_entry(&mut self, db: usize, key: &[u8]) -> Option<&Entry> {
        let now = self.now_ms;
        self.db_mut(db).get_live(key, now)
    }

    pub fn get_mut(&mut self, db: usize, key: &[u8]) -> Option<&mut Value> {
        let now = self.now_ms;
        self.db_mut(db).get_live_mut(key, now).map(|e| &mut e.value)
    }

    /// Fetch the value for `key`, inserting `default()` if it is absent (or
    /// absent due to lazy expiration). Used by collection-mutating commands
    /// that auto-vivify (LPUSH on a missing key, SADD, etc).
    pub fn get_or_insert_with(
        &mut self,
        db: usize,
        key: &[u8],
        default: impl FnOnce() -> Value,
    ) -> &mut Value {
        let now = self.now_ms;
        let database = self.db_mut(db);
        if database.get_live(key, now).is_none() {
            database
                .entries
                .insert(Bytes::copy_from_slice(key), Entry::new(default()));
        }
        &mut database.entries.get_mut(key).unwrap().value
    }

    pub fn put(&mut self, db: usize, key: Bytes, value: Value) {
        self.db_mut(db).entries.insert(key, Entry::new(value));
    }

    pub fn put_entry(&mut self, db: usize, key: Bytes, entry: Entry) {
        self.db_mut(db).entries.insert(key, entry);
    }

    /// Removes `key` if, after the caller's mutation, its value is an empty
    /// collection (spec.md invariant). No-op for keys holding a string or
    /// that are otherwise non-empty.
    pub fn remove_if_empty(&mut self, db: usize, key: &[u8]) {
        let database = self.db_mut(db);
        if let Some(entry) = database.entries.get(key) {
            if entry.value.is_empty_collection() {
                database.entries.remove(key);
            }
        }
    }

    pub fn delete(&mut self, db: usize, key: &[u8]) -> bool {
        self.db_mut(db).entries.remove(key).is_some()
    }

    pub fn exists(&mut self, db: usize, key: &[u8]) -> bool {
        self.get(db, key).is_some()
    }

    pub fn rename(&mut self, db: usize, from: &[u8], to: Bytes) -> bool {
        let now = self.now_ms;
        let database = self.db_mut(db);
        match database.get_live(from, now) {
            Some(_) => {
                let entry = database.entries.remove(from).unwrap();
                database.entries.insert(to, entry);
                true
            }
            None => false,
        }
    }

    pub fn set_expiry(&mut self, db: usize, key: &[u8], at_ms: i64) -> bool {
        let now = self.now_ms;
        match self.db_mut(db).get_live_mut(key, now) {
            Some(entry) => {
                entry.expire_at = Some(at_ms);
                true
            }
            None => false,
        }
    }

    pub fn clear_expiry(&mut self, db: usize, key: &[u8]) -> bool {
        let now = self.now_ms;
        match self.db_mut(db).get_live_mut(key, now) {
            Some(entry) if entry.expire_at.is_some() => {
                entry.expire_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn flush(&mut self, db: usize) {
        self.db_mut(db).entries.clear();
    }

    pub fn flush_all(&mut self) {
        for database in self.guard.dbs.iter_mut() {
            database.entries.clear();
        }
    }

    pub fn size(&mut self, db: usize) -> usize {
        // Opportunistically expiring on size queries isn't required; report
        // the resident count (lazily-expired-but-not-yet-reaped keys are
        // rare in practice and DBSIZE in real Redis has the same property).
        self.guard.dbs[db].entries.len()
    }

    pub fn random_key(&mut self, db: usize) -> Option<Bytes> {
        let now = self.now_ms;
        let database = self.db_mut(db);
        // Lazily drop anything expired so we don't hand back a dead key.
        let expired: Vec<Bytes> = database
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in expired {
            database.entries.remove(&k);
        }
        if database.entries.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..database.entries.len());
        database.entries.keys().nth(idx).cloned()
    }

    pub fn database_count(&self) -> usize {
        self.guard.dbs.len()
    }

    /// Sample up to `sample` keys carrying an expiry (used by the reaper).
    /// Uses reservoir sampling over the TTL-bearing keys so repeated ticks
    /// don't keep inspecting the same lexicographic prefix of the keyspace
    /// forever (spec.md §4.4: "sample up to S random keys with expiry set").
    pub fn keys_with_expiry_sample(&mut self, db: usize, sample: usize) -> Vec<(Bytes, i64)> {
        let mut rng = rand::thread_rng();
        let mut reservoir: Vec<(Bytes, i64)> = Vec::with_capacity(sample);
        let mut seen = 0usize;
        for (k, e) in self.guard.dbs[db].entries.iter() {
            let Some(at) = e.expire_at else { continue };
            seen += 1;
            if reservoir.len() < sample {
                reservoir.push((k.clone(), at));
            } else {
                let j = rng.gen_range(0..seen);
                if j < sample {
                    reservoir[j] = (k.clone(), at);
                }
            }
        }
        reservoir
    }

    pub fn all_keys(&self, db: usize) -> Vec<Bytes> {
        self.guard.dbs[db].entries.keys().cloned().collect()
    }

    /// Produces a structural clone of the whole keyspace for BGSAVE: cheap
    /// for string/list/set/hash values (`Bytes` is refcounted), O(n log n)
    /// per zset (see the `Value`/`SortedSet` clone impls).
    pub fn snapshot_clone(&self) -> Vec<Database> {
        self.guard.dbs.clone()
    }

    /// Borrows the live databases directly, for `SAVE`'s synchronous path
    /// which serializes under this same guard rather than cloning first
    /// (spec.md §5: "SAVE holds the keyspace lock for the whole
    /// serialization").
    pub fn databases(&self) -> &[Database] {
        &self.guard.dbs
    }
}

/// Captured, order-stable state for one in-progress SCAN-family cursor:
/// the full key/member list as of cursor 0, plus how far we've consumed it.
/// This is "strategy (b)" from spec.md §9 (a per-scan snapshot indexed by
/// cursor), chosen over reverse-binary-bit iteration because the keyspace
/// is already backed by an order-stable `BTreeMap` rather than a
/// fixed-size open-addressed table.
struct ScanCursorState {
    items: Vec<Bytes>,
    offset: usize,
}

struct Shared {
    keyspace: Mutex<Keyspace>,
    scans: Mutex<HashMap<u64, ScanCursorState>>,
    next_cursor: AtomicU64,
}

/// Handle to the keyspace. Cheaply cloneable; all clones share the same
/// underlying databases and mutex.
#[derive(Clone)]
pub struct Db {
    shared: Arc<Shared>,
}

impl Db {
    pub fn new(databases: usize) -> Db {
        let dbs = (0..databases).map(|_| Database::default()).collect();
        Db {
            shared: Arc::new(Shared {
                keyspace: Mutex::new(Keyspace { dbs }),
                scans: Mutex::new(HashMap::new()),
                next_cursor: AtomicU64::new(1),
            }),
        }
    }

    /// Advances (or starts, for `cursor == 0`) a SCAN-family iteration.
    /// `fetch_all` is called only when starting a fresh scan; it should
    /// return every item currently in the collection being scanned. Returns
    /// the next cursor (`0` once exhausted) and the batch of items to
    /// return this round. An unrecognized (e.g. stale or already-exhausted)
    /// non-zero cursor yields `(0, vec![])`, matching real Redis, which
    /// treats an invalid cursor as "scan complete" rather than an error.
    pub fn scan(
        &self,
        cursor: u64,
        count: usize,
        fetch_all: impl FnOnce() -> Vec<Bytes>,
    ) -> (u64, Vec<Bytes>) {
        let count = count.max(1);
        let mut table = self.shared.scans.lock().unwrap();

        let mut state = if cursor == 0 {
            ScanCursorState {
                items: fetch_all(),
                offset: 0,
            }
        } else {
            match table.remove(&cursor) {
                Some(s) => s,
                None => return (0, Vec::new()),
            }
        };

        let end = (state.offset + count).min(state.items.len());
        let batch = state.items[state.offset..end].to_vec();
        state.offset = end;

        if state.offset >= state.items.len() {
            (0, batch)
        } else {
            let new_cursor = self.shared.next_cursor.fetch_add(1, Ordering::Relaxed);
            table.insert(new_cursor, state);
            (new_cursor, batch)
        }
    }

    /// Acquire the single keyspace lock for the duration of one command.
    pub fn lock(&self) -> KeyspaceGuard<'_> {
        KeyspaceGuard {
            guard: self.shared.keyspace.lock().unwrap(),
            now_ms: crate::utils::now_timestamp_in_millis(),
        }
    }

    pub fn database_count(&self) -> usize {
        self.shared.keyspace.lock().unwrap().dbs.len()
    }

    /// Replace the entire keyspace, e.g. after restoring a snapshot at boot.
    pub fn restore(&self, dbs: Vec<Database>) {
        let mut guard = self.shared.keyspace.lock().unwrap();
        guard.dbs = dbs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_expiry_hides_and_removes_expired_entries() {
        let db = Db::new(1);
        {
            let mut g = db.lock();
            g.put(
                0,
                Bytes::from_static(b"k"),
                Value::String(Bytes::from_static(b"v")),
            );
            let now = g.now_ms();
            g.set_expiry(0, b"k", now - 1);
        }
        let mut g = db.lock();
        assert!(g.get(0, b"k").is_none());
        assert_eq!(g.size(0), 0);
    }

    #[test]
    fn rename_moves_value_and_expiry() {
        let db = Db::new(1);
        let mut g = db.lock();
        g.put(
            0,
            Bytes::from_static(b"a"),
            Value::String(Bytes::from_static(b"1")),
        );
        let now = g.now_ms();
        g.set_expiry(0, b"a", now + 100_000);
        assert!(g.rename(0, b"a", Bytes::from_static(b"b")));
        assert!(g.get(0, b"a").is_none());
        assert!(g.get_entry(0, b"b").unwrap().expire_at.is_some());
    }

    #[test]
    fn flush_only_clears_target_database() {
        let db = Db::new(2);
        let mut g = db.lock();
        g.put(
            0,
            Bytes::from_static(b"a"),
            Value::String(Bytes::from_static(b"1")),
        );
        g.put(
            1,
            Bytes::from_static(b"b"),
            Value::String(Bytes::from_static(b"1")),
        );
        g.flush(0);
        assert_eq!(g.size(0), 0);
        assert_eq!(g.size(1), 1);
    }

    #[test]
    fn empty_collection_is_removed_by_caller_convention() {
        let db = Db::new(1);
        let mut g = db.lock();
        g.get_or_insert_with(0, b"s", || Value::Set(HashSet::new()));
        if let Some(Value::Set(set)) = g.get_mut(0, b"s") {
            set.insert(Bytes::from_static(b"m"));
            set.remove(b"m" as &[u8]);
        }
        g.remove_if_empty(0, b"s");
        assert!(g.get(0, b"s").is_none());
    }
}
