//! The snapshotter (spec.md §4.7): serializes the keyspace to a single file
//! and restores it at boot. `SAVE` serializes under the keyspace lock;
//! `BGSAVE` takes a structural clone under the lock (see
//! `Db::snapshot_clone`) and serializes it afterwards, outside the lock, so
//! concurrent writes are simply not reflected in that snapshot (spec.md
//! §5 "Snapshot concurrency").
//!
//! The file format is self-describing but deliberately simple: a 9-byte
//! magic/version header, one section per database, and an 8-byte trailing
//! CRC-64 checksum. Restore is fail-closed: any structural or checksum
//! mismatch discards the file entirely rather than accepting a partial
//! image (spec.md: "it never accepts partial restores silently").

use crate::db::{Database, Db, Entry, Value};
use crate::zset::SortedSet;

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{error, info};

const MAGIC: &[u8; 9] = b"DUSKDB01\0";

const OP_SELECT_DB: u8 = 0xFE;
const OP_ENTRY: u8 = 0xFD;
const OP_EOF: u8 = 0xFF;

const TYPE_STRING: u8 = 0;
const TYPE_LIST: u8 = 1;
const TYPE_SET: u8 = 2;
const TYPE_HASH: u8 = 3;
const TYPE_ZSET: u8 = 4;

/// Serializes `dbs` (as produced by `Db::snapshot_clone`) to `path`,
/// write-then-atomic-rename so a crash or write error never corrupts the
/// previous snapshot (spec.md §7: "write errors ... leave the previous
/// snapshot untouched").
pub fn save(dbs: &[Database], path: &Path) -> io::Result<()> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);

    for (index, database) in dbs.iter().enumerate() {
        buf.push(OP_SELECT_DB);
        buf.extend_from_slice(&(index as u32).to_le_bytes());

        for (key, entry) in &database.entries {
            buf.push(OP_ENTRY);
            match entry.expire_at {
                Some(at) => {
                    buf.push(1);
                    buf.extend_from_slice(&at.to_le_bytes());
                }
                None => buf.push(0),
            }
            encode_entry(&mut buf, key, entry);
        }
    }
    buf.push(OP_EOF);

    let checksum = crc64(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());

    let tmp_path = path.with_extension("tmp");
    {
        let mut f = std::fs::File::create(&tmp_path)?;
        f.write_all(&buf)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn encode_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(data);
}

fn encode_entry(buf: &mut Vec<u8>, key: &Bytes, entry: &Entry) {
    match &entry.value {
        Value::String(s) => {
            buf.push(TYPE_STRING);
            encode_bytes(buf, key);
            encode_bytes(buf, s);
        }
        Value::List(list) => {
            buf.push(TYPE_LIST);
            encode_bytes(buf, key);
            buf.extend_from_slice(&(list.len() as u32).to_le_bytes());
            for item in list {
                encode_bytes(buf, item);
            }
        }
        Value::Set(set) => {
            buf.push(TYPE_SET);
            encode_bytes(buf, key);
            buf.extend_from_slice(&(set.len() as u32).to_le_bytes());
            for item in set {
                encode_bytes(buf, item);
            }
        }
        Value::Hash(hash) => {
            buf.push(TYPE_HASH);
            encode_bytes(buf, key);
            buf.extend_from_slice(&(hash.len() as u32).to_le_bytes());
            for (field, value) in hash {
                encode_bytes(buf, field);
                encode_bytes(buf, value);
            }
        }
        Value::ZSet(zset) => {
            buf.push(TYPE_ZSET);
            encode_bytes(buf, key);
            let members: Vec<_> = zset.iter().collect();
            buf.extend_from_slice(&(members.len() as u32).to_le_bytes());
            for (member, score) in members {
                encode_bytes(buf, member);
                buf.extend_from_slice(&score.to_le_bytes());
            }
        }
    }
}

/// Restores a keyspace from `path`. Any structural problem (missing file,
/// bad magic, truncated section, checksum mismatch) is reported as `Ok(None)`
/// with the error logged by the caller — this implements the fail-closed
/// contract: the server starts empty rather than risk a partial restore.
pub fn load(path: &Path, databases: usize) -> io::Result<Option<Vec<Database>>> {
    let mut f = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;

    match parse(&buf, databases) {
        Some(dbs) => Ok(Some(dbs)),
        None => Ok(None),
    }
}

/// Restores `path` into `db` at boot, matching spec.md's fail-closed
/// contract: any problem (missing file aside) is logged and the server
/// keeps its freshly created, empty keyspace rather than risk a partial
/// restore.
pub fn restore_at_boot(db: &Db, path: &Path) {
    match load(path, db.database_count()) {
        Ok(Some(dbs)) => {
            let total: usize = dbs.iter().map(|d| d.entries.len()).sum();
            db.restore(dbs);
            info!(keys = total, path = %path.display(), "restored snapshot");
        }
        Ok(None) => info!(path = %path.display(), "no snapshot to restore"),
        Err(err) => error!(%err, path = %path.display(), "failed to restore snapshot; starting empty"),
    }
}

/// Spawns the periodic snapshot task (spec.md §4.7). Every tick, asks
/// `cmd::save::maybe_periodic_save` whether enough keys have changed since
/// the last save to justify writing the file again.
pub fn spawn_periodic(db: Db, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match crate::cmd::save::maybe_periodic_save(&db) {
                Ok(true) => info!("periodic snapshot written"),
                Ok(false) => {}
                Err(err) => error!(%err, "periodic snapshot failed"),
            }
        }
    });
}

fn parse(buf: &[u8], databases: usize) -> Option<Vec<Database>> {
    if buf.len() < MAGIC.len() + 8 {
        return None;
    }
    let (body, checksum_bytes) = buf.split_at(buf.len() - 8);
    let expected = u64::from_le_bytes(checksum_bytes.try_into().ok()?);
    if crc64(body) != expected {
        return None;
    }
    if &body[..MAGIC.len()] != MAGIC {
        return None;
    }

    let mut dbs: Vec<Database> = (0..databases).map(|_| Database::default()).collect();
    let mut cursor = MAGIC.len();
    let mut current_db = 0usize;

    loop {
        let op = *body.get(cursor)?;
        cursor += 1;
        match op {
            OP_SELECT_DB => {
                let idx = read_u32(body, &mut cursor)? as usize;
                if idx >= dbs.len() {
                    return None;
                }
                current_db = idx;
            }
            OP_ENTRY => {
                let has_expiry = *body.get(cursor)?;
                cursor += 1;
                let expire_at = match has_expiry {
                    0 => None,
                    1 => Some(read_i64(body, &mut cursor)?),
                    _ => return None,
                };
                let (key, value) = decode_entry(body, &mut cursor)?;
                dbs[current_db]
                    .entries
                    .insert(key, Entry { value, expire_at });
            }
            OP_EOF => return Some(dbs),
            _ => return None,
        }
    }
}

fn read_u32(body: &[u8], cursor: &mut usize) -> Option<u32> {
    let bytes = body.get(*cursor..*cursor + 4)?;
    *cursor += 4;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_i64(body: &[u8], cursor: &mut usize) -> Option<i64> {
    let bytes = body.get(*cursor..*cursor + 8)?;
    *cursor += 8;
    Some(i64::from_le_bytes(bytes.try_into().ok()?))
}

fn read_f64(body: &[u8], cursor: &mut usize) -> Option<f64> {
    let bytes = body.get(*cursor..*cursor + 8)?;
    *cursor += 8;
    Some(f64::from_le_bytes(bytes.try_into().ok()?))
}

fn read_bytes(body: &[u8], cursor: &mut usize) -> Option<Bytes> {
    let len = read_u32(body, cursor)? as usize;
    let data = body.get(*cursor..*cursor + len)?;
    *cursor += len;
    Some(Bytes::copy_from_slice(data))
}

fn decode_entry(body: &[u8], cursor: &mut usize) -> Option<(Bytes, Value)> {
    let kind = *body.get(*cursor)?;
    *cursor += 1;
    let key = read_bytes(body, cursor)?;

    let value = match kind {
        TYPE_STRING => Value::String(read_bytes(body, cursor)?),
        TYPE_LIST => {
            let count = read_u32(body, cursor)?;
            let mut list = VecDeque::with_capacity(count as usize);
            for _ in 0..count {
                list.push_back(read_bytes(body, cursor)?);
            }
            Value::List(list)
        }
        TYPE_SET => {
            let count = read_u32(body, cursor)?;
            let mut set = HashSet::with_capacity(count as usize);
            for _ in 0..count {
                set.insert(read_bytes(body, cursor)?);
            }
            Value::Set(set)
        }
        TYPE_HASH => {
            let count = read_u32(body, cursor)?;
            let mut hash = HashMap::with_capacity(count as usize);
            for _ in 0..count {
                let field = read_bytes(body, cursor)?;
                let value = read_bytes(body, cursor)?;
                hash.insert(field, value);
            }
            Value::Hash(hash)
        }
        TYPE_ZSET => {
            let count = read_u32(body, cursor)?;
            let mut zset = SortedSet::new();
            for _ in 0..count {
                let member = read_bytes(body, cursor)?;
                let score = read_f64(body, cursor)?;
                zset.insert(member, score);
            }
            Value::ZSet(zset)
        }
        _ => return None,
    };

    Some((key, value))
}

/// Table-driven CRC-64 (ISO 3309 polynomial, reflected), computed once at
/// first use. There is no CRC-64 crate in the teacher's dependency stack, so
/// this is implemented directly, as SPEC_FULL.md calls for.
fn crc64(data: &[u8]) -> u64 {
    const POLY: u64 = 0xD800_0000_0000_0000;

    static TABLE: std::sync::OnceLock<[u64; 256]> = std::sync::OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut table = [0u64; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut crc = i as u64;
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ POLY
                } else {
                    crc >> 1
                };
            }
            *slot = crc;
        }
        table
    });

    let mut crc = !0u64;
    for &byte in data {
        let idx = ((crc ^ byte as u64) & 0xFF) as usize;
        crc = table[idx] ^ (crc >> 8);
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, Entry, Value};

    #[test]
    fn round_trips_all_five_kinds() {
        let mut db0 = Database::default();
        db0.entries.insert(
            Bytes::from_static(b"s"),
            Entry::new(Value::String(Bytes::from_static(b"hello"))),
        );
        db0.entries.insert(
            Bytes::from_static(b"l"),
            Entry::new(Value::List(VecDeque::from(vec![
                Bytes::from_static(b"a"),
                Bytes::from_static(b"b"),
            ]))),
        );
        let mut set = HashSet::new();
        set.insert(Bytes::from_static(b"m1"));
        db0.entries
            .insert(Bytes::from_static(b"st"), Entry::new(Value::Set(set)));
        let mut hash = HashMap::new();
        hash.insert(Bytes::from_static(b"f"), Bytes::from_static(b"v"));
        db0.entries
            .insert(Bytes::from_static(b"h"), Entry::new(Value::Hash(hash)));
        let mut zset = SortedSet::new();
        zset.insert(Bytes::from_static(b"z1"), 1.5);
        let mut zentry = Entry::new(Value::ZSet(zset));
        zentry.expire_at = Some(123456789);
        db0.entries.insert(Bytes::from_static(b"z"), zentry);

        let dbs = vec![db0, Database::default()];
        let dir = std::env::temp_dir().join(format!("duskdb-test-{}.rdb", std::process::id()));
        save(&dbs, &dir).unwrap();
        let restored = load(&dir, 2).unwrap().unwrap();
        std::fs::remove_file(&dir).ok();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].entries.len(), 5);
        match &restored[0].entries[&Bytes::from_static(b"s")].value {
            Value::String(s) => assert_eq!(s, &Bytes::from_static(b"hello")),
            _ => panic!("expected string"),
        }
        assert_eq!(
            restored[0].entries[&Bytes::from_static(b"z")].expire_at,
            Some(123456789)
        );
    }

    #[test]
    fn corrupted_checksum_fails_closed() {
        let dbs = vec![Database::default()];
        let dir =
            std::env::temp_dir().join(format!("duskdb-test-corrupt-{}.rdb", std::process::id()));
        save(&dbs, &dir).unwrap();

        let mut bytes = std::fs::read(&dir).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&dir, &bytes).unwrap();

        let restored = load(&dir, 1).unwrap();
        std::fs::remove_file(&dir).ok();
        assert!(restored.is_none());
    }
}
