//! The command table: one module per command family, a `Command` enum that
//! wraps whichever struct implements it, and the `Context` every command's
//! `apply` is handed.
//!
//! Parsing and application are deliberately split: `Command::from_frame`
//! turns a raw RESP array into a typed `Command` (catching arity and option
//! errors early), and `Command::apply` runs it against the keyspace. This
//! mirrors the teacher's own `Command`/`apply` split, generalized from a
//! dozen commands to duskdb's full surface.

pub mod admin;
pub mod append;
pub mod blpop;
pub mod bzpop;
pub mod expire;
pub mod get;
pub mod getdel;
pub mod getex;
pub mod getrange;
pub mod getset;
pub mod hdel;
pub mod hexists;
pub mod hget;
pub mod hgetall;
pub mod hincrby;
pub mod hincrbyfloat;
pub mod hlen;
pub mod hmget;
pub mod hrandfield;
pub mod hscan;
pub mod hset;
pub mod hstrlen;
pub mod incrbyfloat;
pub mod incrdecr;
pub mod key;
pub mod lindex;
pub mod linsert;
pub mod llen;
pub mod lmove;
pub mod lpos;
pub mod lrange;
pub mod lrem;
pub mod lset;
pub mod ltrim;
pub mod mget;
pub mod mset;
pub mod pop;
pub mod pubsub;
pub mod push;
pub mod sadd;
pub mod save;
pub mod scan;
pub mod scard;
pub mod set;
pub mod setnx;
pub mod setop;
pub mod setrange;
pub mod sismember;
pub mod smembers;
pub mod smismember;
pub mod smove;
pub mod spop;
pub mod srandmember;
pub mod srem;
pub mod sscan;
pub mod strlen;
pub mod zadd;
pub mod zcard;
pub mod zcount;
pub mod zincrby;
pub mod zlexcount;
pub mod zmscore;
pub mod zpop;
pub mod zrandmember;
pub mod zrange;
pub mod zrank;
pub mod zrem;
pub mod zremrange;
pub mod zscan;
pub mod zscore;
pub mod zsetop;

use crate::db::{Db, KeyspaceGuard};
use crate::hub::Hub;
use crate::parse::Parse;
use crate::session::Session;
use crate::Frame;

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use tokio::sync::mpsc;

/// The number of distinct commands duskdb answers to. Reported by `COMMAND
/// COUNT`; kept as a constant rather than computed from the `Command` enum
/// since Rust has no reflection over enum variant count.
pub(crate) const COMMAND_COUNT: i64 = 140;

/// Everything a command's `apply` needs: the shared keyspace, the pub/sub
/// hub, this connection's session state, and the channel subscribe-family
/// commands use to push extra acknowledgements (see `pubsub::Subscribe`).
///
/// `held` is `None` for an ordinary top-level command, in which case
/// `lock()` takes a fresh, single-command `KeyspaceGuard` the same way
/// `ctx.lock()` always used to. `EXEC` sets it to a guard acquired once
/// for the whole queued batch (spec.md §4.3 "EXEC runs the queue
/// atomically"), so every queued command's `lock()` call reuses that same
/// guard instead of releasing and re-acquiring the keyspace mutex between
/// them, which would let another connection's command interleave mid-batch.
pub struct Context<'a> {
    pub db: &'a Db,
    pub hub: &'a Hub,
    pub session: &'a mut Session,
    pub push_tx: &'a mpsc::UnboundedSender<Frame>,
    held: Option<&'a RefCell<KeyspaceGuard<'a>>>,
}

impl<'a> Context<'a> {
    pub fn new(
        db: &'a Db,
        hub: &'a Hub,
        session: &'a mut Session,
        push_tx: &'a mpsc::UnboundedSender<Frame>,
    ) -> Context<'a> {
        Context {
            db,
            hub,
            session,
            push_tx,
            held: None,
        }
    }

    /// Same as `new`, but every `lock()` call reuses `guard` instead of
    /// locking `db` again. Used to apply a whole `EXEC` batch under one
    /// critical section.
    pub fn with_held_lock(
        db: &'a Db,
        hub: &'a Hub,
        session: &'a mut Session,
        push_tx: &'a mpsc::UnboundedSender<Frame>,
        guard: &'a RefCell<KeyspaceGuard<'a>>,
    ) -> Context<'a> {
        Context {
            db,
            hub,
            session,
            push_tx,
            held: Some(guard),
        }
    }

    /// Acquires the keyspace guard this command should operate under: the
    /// batch-wide guard if one is held (`EXEC`), otherwise a fresh lock.
    pub fn lock(&self) -> LockGuard<'a> {
        match self.held {
            Some(cell) => LockGuard::Borrowed(cell.borrow_mut()),
            None => LockGuard::Owned(self.db.lock()),
        }
    }
}

/// Returned by `Context::lock`; derefs to `KeyspaceGuard` so call sites don't
/// need to know whether the guard is this command's own or shared with the
/// rest of an `EXEC` batch.
pub enum LockGuard<'a> {
    Owned(KeyspaceGuard<'a>),
    Borrowed(std::cell::RefMut<'a, KeyspaceGuard<'a>>),
}

impl<'a> Deref for LockGuard<'a> {
    type Target = KeyspaceGuard<'a>;

    fn deref(&self) -> &KeyspaceGuard<'a> {
        match self {
            LockGuard::Owned(g) => g,
            LockGuard::Borrowed(g) => g,
        }
    }
}

impl<'a> DerefMut for LockGuard<'a> {
    fn deref_mut(&mut self) -> &mut KeyspaceGuard<'a> {
        match self {
            LockGuard::Owned(g) => g,
            LockGuard::Borrowed(g) => g,
        }
    }
}

/// A parsed RESP command, ready to `apply` against a `Context`.
///
/// Many Redis commands are thin variations on one behavior (LPUSH/RPUSH,
/// INCR/DECR/INCRBY/DECRBY, ZRANGE and its five legacy spellings); those
/// share one implementation struct, parsed through different constructors,
/// and are kept as distinct enum variants here only so `get_name` can return
/// the command's own name rather than its implementation's.
#[derive(Debug)]
pub enum Command {
    // strings
    Set(set::Set),
    Get(get::Get),
    Getset(getset::Getset),
    Getdel(getdel::Getdel),
    Getex(getex::Getex),
    Append(append::Append),
    Strlen(strlen::Strlen),
    Getrange(getrange::Getrange),
    Setrange(setrange::Setrange),
    Incr(incrdecr::IncrDecr),
    Decr(incrdecr::IncrDecr),
    Incrby(incrdecr::IncrDecr),
    Decrby(incrdecr::IncrDecr),
    Incrbyfloat(incrbyfloat::IncrByFloat),
    Mset(mset::Mset),
    Msetnx(mset::Mset),
    Mget(mget::Mget),
    Setnx(setnx::Setnx),
    Setex(setnx::Setex),
    Psetex(setnx::Setex),

    // lists
    Lpush(push::Push),
    Rpush(push::Push),
    Lpushx(push::Push),
    Rpushx(push::Push),
    Lpop(pop::Pop),
    Rpop(pop::Pop),
    Llen(llen::Llen),
    Lrange(lrange::Lrange),
    Lindex(lindex::Lindex),
    Lset(lset::Lset),
    Linsert(linsert::Linsert),
    Lrem(lrem::Lrem),
    Ltrim(ltrim::Ltrim),
    Lpos(lpos::Lpos),
    Lmove(lmove::Lmove),
    Rpoplpush(lmove::Lmove),
    Blpop(blpop::Blpop),
    Brpop(blpop::Blpop),
    Brpoplpush(blpop::Brpoplpush),
    Blmove(blpop::Blmove),

    // hashes
    Hset(hset::Hset),
    Hmset(hset::Hset),
    Hsetnx(hset::Hset),
    Hget(hget::Hget),
    Hmget(hmget::Hmget),
    Hgetall(hgetall::Hgetall),
    Hkeys(hgetall::Hgetall),
    Hvals(hgetall::Hgetall),
    Hdel(hdel::Hdel),
    Hlen(hlen::Hlen),
    Hexists(hexists::Hexists),
    Hincrby(hincrby::Hincrby),
    Hincrbyfloat(hincrbyfloat::Hincrbyfloat),
    Hstrlen(hstrlen::Hstrlen),
    Hrandfield(hrandfield::Hrandfield),
    Hscan(hscan::Hscan),

    // sets
    Sadd(sadd::Sadd),
    Srem(srem::Srem),
    Sismember(sismember::Sismember),
    Smismember(smismember::Smismember),
    Scard(scard::Scard),
    Smembers(smembers::Smembers),
    Smove(smove::Smove),
    Spop(spop::Spop),
    Srandmember(srandmember::Srandmember),
    Sunion(setop::Setop),
    Sinter(setop::Setop),
    Sdiff(setop::Setop),
    Sunionstore(setop::Setop),
    Sinterstore(setop::Setop),
    Sdiffstore(setop::Setop),
    Sscan(sscan::Sscan),

    // sorted sets
    Zadd(zadd::Zadd),
    Zrem(zrem::Zrem),
    Zscore(zscore::Zscore),
    Zmscore(zmscore::Zmscore),
    Zincrby(zincrby::Zincrby),
    Zcard(zcard::Zcard),
    Zcount(zcount::Zcount),
    Zlexcount(zlexcount::Zlexcount),
    Zrank(zrank::Zrank),
    Zrevrank(zrank::Zrank),
    Zrange(zrange::Zrange),
    Zrevrange(zrange::Zrange),
    Zrangebyscore(zrange::Zrange),
    Zrevrangebyscore(zrange::Zrange),
    Zrangebylex(zrange::Zrange),
    Zrevrangebylex(zrange::Zrange),
    Zrangestore(zrange::Zrange),
    Zrandmember(zrandmember::Zrandmember),
    Zpopmin(zpop::Zpop),
    Zpopmax(zpop::Zpop),
    Bzpopmin(bzpop::Bzpop),
    Bzpopmax(bzpop::Bzpop),
    Zremrangebyrank(zremrange::Zremrange),
    Zremrangebyscore(zremrange::Zremrange),
    Zremrangebylex(zremrange::Zremrange),
    Zunionstore(zsetop::Zsetop),
    Zinterstore(zsetop::Zsetop),
    Zdiffstore(zsetop::Zsetop),
    Zunion(zsetop::Zsetop),
    Zinter(zsetop::Zsetop),
    Zdiff(zsetop::Zsetop),
    Zscan(zscan::Zscan),

    // keyspace
    Del(key::Del),
    Exists(key::Exists),
    Type(key::TypeCmd),
    Rename(key::Rename),
    Renamenx(key::Rename),
    Randomkey(key::Randomkey),
    Expire(expire::Expire),
    Pexpire(expire::Expire),
    Expireat(expire::Expire),
    Pexpireat(expire::Expire),
    Ttl(expire::Ttl),
    Pttl(expire::Ttl),
    Persist(expire::Persist),
    Keys(scan::Keys),
    Scan(scan::Scan),

    // server / admin
    Ping(admin::Ping),
    Echo(admin::Echo),
    Select(admin::Select),
    Dbsize(admin::Dbsize),
    Flushdb(admin::Flush),
    Flushall(admin::Flush),
    Time(admin::Time),
    Info(admin::Info),
    CommandDoc(admin::CommandCmd),
    Config(admin::ConfigCmd),
    Debug(admin::DebugSleep),
    Auth(admin::Auth),
    Client(admin::Client),
    Save(save::Save),
    Bgsave(save::Bgsave),
    Lastsave(save::Lastsave),

    // pub/sub
    Subscribe(pubsub::Subscribe),
    Unsubscribe(pubsub::Unsubscribe),
    Psubscribe(pubsub::Psubscribe),
    Punsubscribe(pubsub::Punsubscribe),
    Publish(pubsub::Publish),
    Pubsub(pubsub::Pubsub),

    // connection / transaction control, handled specially by the server
    Multi,
    Discard,
    Exec,
    Quit,
    Shutdown(Option<String>),
}

impl Command {
    /// Parses a full RESP request (already validated to be an array of bulk
    /// strings by the caller) into a `Command`. The first element is the
    /// command name; everything after it is handed to that command's own
    /// parser.
    pub fn from_frame(frame: Frame) -> crate::Result<Command> {
        let mut parse = Parse::new(frame)?;
        let name = parse.next_string()?.to_lowercase();

        let command = match name.as_str() {
            "set" => Command::Set(set::Set::parse_frames(&mut parse)?),
            "get" => Command::Get(get::Get::parse_frames(&mut parse)?),
            "getset" => Command::Getset(getset::Getset::parse_frames(&mut parse)?),
            "getdel" => Command::Getdel(getdel::Getdel::parse_frames(&mut parse)?),
            "getex" => Command::Getex(getex::Getex::parse_frames(&mut parse)?),
            "append" => Command::Append(append::Append::parse_frames(&mut parse)?),
            "strlen" => Command::Strlen(strlen::Strlen::parse_frames(&mut parse)?),
            "getrange" => Command::Getrange(getrange::Getrange::parse_frames(&mut parse)?),
            "setrange" => Command::Setrange(setrange::Setrange::parse_frames(&mut parse)?),
            "incr" => Command::Incr(incrdecr::IncrDecr::parse_frames(&mut parse, false, false)?),
            "decr" => Command::Decr(incrdecr::IncrDecr::parse_frames(&mut parse, false, true)?),
            "incrby" => Command::Incrby(incrdecr::IncrDecr::parse_frames(&mut parse, true, false)?),
            "decrby" => Command::Decrby(incrdecr::IncrDecr::parse_frames(&mut parse, true, true)?),
            "incrbyfloat" => Command::Incrbyfloat(incrbyfloat::IncrByFloat::parse_frames(&mut parse)?),
            "mset" => Command::Mset(mset::Mset::parse_frames(&mut parse, false)?),
            "msetnx" => Command::Msetnx(mset::Mset::parse_frames(&mut parse, true)?),
            "mget" => Command::Mget(mget::Mget::parse_frames(&mut parse)?),
            "setnx" => Command::Setnx(setnx::Setnx::parse_frames(&mut parse)?),
            "setex" => Command::Setex(setnx::Setex::parse_frames(&mut parse, false)?),
            "psetex" => Command::Psetex(setnx::Setex::parse_frames(&mut parse, true)?),

            "lpush" => Command::Lpush(push::Push::parse_frames(&mut parse, "left", false)?),
            "rpush" => Command::Rpush(push::Push::parse_frames(&mut parse, "right", false)?),
            "lpushx" => Command::Lpushx(push::Push::parse_frames(&mut parse, "left", true)?),
            "rpushx" => Command::Rpushx(push::Push::parse_frames(&mut parse, "right", true)?),
            "lpop" => Command::Lpop(pop::Pop::parse_frames(&mut parse, "left")?),
            "rpop" => Command::Rpop(pop::Pop::parse_frames(&mut parse, "right")?),
            "llen" => Command::Llen(llen::Llen::parse_frames(&mut parse)?),
            "lrange" => Command::Lrange(lrange::Lrange::parse_frames(&mut parse)?),
            "lindex" => Command::Lindex(lindex::Lindex::parse_frames(&mut parse)?),
            "lset" => Command::Lset(lset::Lset::parse_frames(&mut parse)?),
            "linsert" => Command::Linsert(linsert::Linsert::parse_frames(&mut parse)?),
            "lrem" => Command::Lrem(lrem::Lrem::parse_frames(&mut parse)?),
            "ltrim" => Command::Ltrim(ltrim::Ltrim::parse_frames(&mut parse)?),
            "lpos" => Command::Lpos(lpos::Lpos::parse_frames(&mut parse)?),
            "lmove" => Command::Lmove(lmove::Lmove::parse_frames_lmove(&mut parse)?),
            "rpoplpush" => Command::Rpoplpush(lmove::Lmove::parse_frames_rpoplpush(&mut parse)?),
            "blpop" => Command::Blpop(blpop::Blpop::parse_frames(&mut parse, true)?),
            "brpop" => Command::Brpop(blpop::Blpop::parse_frames(&mut parse, false)?),
            "brpoplpush" => Command::Brpoplpush(blpop::Brpoplpush::parse_frames(&mut parse)?),
            "blmove" => Command::Blmove(blpop::Blmove::parse_frames(&mut parse)?),

            "hset" => Command::Hset(hset::Hset::parse_frames(&mut parse, false)?),
            "hmset" => Command::Hmset(hset::Hset::parse_frames(&mut parse, true)?),
            "hsetnx" => Command::Hsetnx(hset::Hset::parse_frames_nx(&mut parse)?),
            "hget" => Command::Hget(hget::Hget::parse_frames(&mut parse)?),
            "hmget" => Command::Hmget(hmget::Hmget::parse_frames(&mut parse)?),
            "hgetall" => Command::Hgetall(hgetall::Hgetall::parse_all(&mut parse)?),
            "hkeys" => Command::Hkeys(hgetall::Hgetall::parse_keys(&mut parse)?),
            "hvals" => Command::Hvals(hgetall::Hgetall::parse_values(&mut parse)?),
            "hdel" => Command::Hdel(hdel::Hdel::parse_frames(&mut parse)?),
            "hlen" => Command::Hlen(hlen::Hlen::parse_frames(&mut parse)?),
            "hexists" => Command::Hexists(hexists::Hexists::parse_frames(&mut parse)?),
            "hincrby" => Command::Hincrby(hincrby::Hincrby::parse_frames(&mut parse)?),
            "hincrbyfloat" => Command::Hincrbyfloat(hincrbyfloat::Hincrbyfloat::parse_frames(&mut parse)?),
            "hstrlen" => Command::Hstrlen(hstrlen::Hstrlen::parse_frames(&mut parse)?),
            "hrandfield" => Command::Hrandfield(hrandfield::Hrandfield::parse_frames(&mut parse)?),
            "hscan" => Command::Hscan(hscan::Hscan::parse_frames(&mut parse)?),

            "sadd" => Command::Sadd(sadd::Sadd::parse_frames(&mut parse)?),
            "srem" => Command::Srem(srem::Srem::parse_frames(&mut parse)?),
            "sismember" => Command::Sismember(sismember::Sismember::parse_frames(&mut parse)?),
            "smismember" => Command::Smismember(smismember::Smismember::parse_frames(&mut parse)?),
            "scard" => Command::Scard(scard::Scard::parse_frames(&mut parse)?),
            "smembers" => Command::Smembers(smembers::Smembers::parse_frames(&mut parse)?),
            "smove" => Command::Smove(smove::Smove::parse_frames(&mut parse)?),
            "spop" => Command::Spop(spop::Spop::parse_frames(&mut parse)?),
            "srandmember" => Command::Srandmember(srandmember::Srandmember::parse_frames(&mut parse)?),
            "sunion" => Command::Sunion(setop::Setop::parse_read(&mut parse, "union")?),
            "sinter" => Command::Sinter(setop::Setop::parse_read(&mut parse, "inter")?),
            "sdiff" => Command::Sdiff(setop::Setop::parse_read(&mut parse, "diff")?),
            "sunionstore" => Command::Sunionstore(setop::Setop::parse_store(&mut parse, "union")?),
            "sinterstore" => Command::Sinterstore(setop::Setop::parse_store(&mut parse, "inter")?),
            "sdiffstore" => Command::Sdiffstore(setop::Setop::parse_store(&mut parse, "diff")?),
            "sscan" => Command::Sscan(sscan::Sscan::parse_frames(&mut parse)?),

            "zadd" => Command::Zadd(zadd::Zadd::parse_frames(&mut parse)?),
            "zrem" => Command::Zrem(zrem::Zrem::parse_frames(&mut parse)?),
            "zscore" => Command::Zscore(zscore::Zscore::parse_frames(&mut parse)?),
            "zmscore" => Command::Zmscore(zmscore::Zmscore::parse_frames(&mut parse)?),
            "zincrby" => Command::Zincrby(zincrby::Zincrby::parse_frames(&mut parse)?),
            "zcard" => Command::Zcard(zcard::Zcard::parse_frames(&mut parse)?),
            "zcount" => Command::Zcount(zcount::Zcount::parse_frames(&mut parse)?),
            "zlexcount" => Command::Zlexcount(zlexcount::Zlexcount::parse_frames(&mut parse)?),
            "zrank" => Command::Zrank(zrank::Zrank::parse_frames(&mut parse, false)?),
            "zrevrank" => Command::Zrevrank(zrank::Zrank::parse_frames(&mut parse, true)?),
            "zrange" => Command::Zrange(zrange::Zrange::parse_generic(&mut parse, None)?),
            "zrevrange" => Command::Zrevrange(zrange::Zrange::parse_revrange(&mut parse)?),
            "zrangebyscore" => Command::Zrangebyscore(zrange::Zrange::parse_rangebyscore(&mut parse, false)?),
            "zrevrangebyscore" => Command::Zrevrangebyscore(zrange::Zrange::parse_rangebyscore(&mut parse, true)?),
            "zrangebylex" => Command::Zrangebylex(zrange::Zrange::parse_rangebylex(&mut parse, false)?),
            "zrevrangebylex" => Command::Zrevrangebylex(zrange::Zrange::parse_rangebylex(&mut parse, true)?),
            "zrangestore" => {
                let destination = parse.next_string()?;
                Command::Zrangestore(zrange::Zrange::parse_generic(&mut parse, Some(destination))?)
            }
            "zrandmember" => Command::Zrandmember(zrandmember::Zrandmember::parse_frames(&mut parse)?),
            "zpopmin" => Command::Zpopmin(zpop::Zpop::parse_frames(&mut parse, false)?),
            "zpopmax" => Command::Zpopmax(zpop::Zpop::parse_frames(&mut parse, true)?),
            "bzpopmin" => Command::Bzpopmin(bzpop::Bzpop::parse_frames(&mut parse, false)?),
            "bzpopmax" => Command::Bzpopmax(bzpop::Bzpop::parse_frames(&mut parse, true)?),
            "zremrangebyrank" => Command::Zremrangebyrank(zremrange::Zremrange::parse_rank(&mut parse)?),
            "zremrangebyscore" => Command::Zremrangebyscore(zremrange::Zremrange::parse_score(&mut parse)?),
            "zremrangebylex" => Command::Zremrangebylex(zremrange::Zremrange::parse_lex(&mut parse)?),
            "zunionstore" => Command::Zunionstore(zsetop::Zsetop::parse_store(&mut parse, "union")?),
            "zinterstore" => Command::Zinterstore(zsetop::Zsetop::parse_store(&mut parse, "inter")?),
            "zdiffstore" => Command::Zdiffstore(zsetop::Zsetop::parse_store(&mut parse, "diff")?),
            "zunion" => Command::Zunion(zsetop::Zsetop::parse_read(&mut parse, "union")?),
            "zinter" => Command::Zinter(zsetop::Zsetop::parse_read(&mut parse, "inter")?),
            "zdiff" => Command::Zdiff(zsetop::Zsetop::parse_read(&mut parse, "diff")?),
            "zscan" => Command::Zscan(zscan::Zscan::parse_frames(&mut parse)?),

            "del" => Command::Del(key::Del::parse_frames(&mut parse)?),
            "exists" => Command::Exists(key::Exists::parse_frames(&mut parse)?),
            "type" => Command::Type(key::TypeCmd::parse_frames(&mut parse)?),
            "rename" => Command::Rename(key::Rename::parse_frames(&mut parse, false)?),
            "renamenx" => Command::Renamenx(key::Rename::parse_frames(&mut parse, true)?),
            "randomkey" => Command::Randomkey(key::Randomkey::parse_frames(&mut parse)?),
            "expire" => Command::Expire(expire::Expire::parse_frames(&mut parse, 1000, false)?),
            "pexpire" => Command::Pexpire(expire::Expire::parse_frames(&mut parse, 1, false)?),
            "expireat" => Command::Expireat(expire::Expire::parse_frames(&mut parse, 1000, true)?),
            "pexpireat" => Command::Pexpireat(expire::Expire::parse_frames(&mut parse, 1, true)?),
            "ttl" => Command::Ttl(expire::Ttl::parse_frames(&mut parse, false)?),
            "pttl" => Command::Pttl(expire::Ttl::parse_frames(&mut parse, true)?),
            "persist" => Command::Persist(expire::Persist::parse_frames(&mut parse)?),
            "keys" => Command::Keys(scan::Keys::parse_frames(&mut parse)?),
            "scan" => Command::Scan(scan::Scan::parse_frames(&mut parse)?),

            "ping" => Command::Ping(admin::Ping::parse_frames(&mut parse)?),
            "echo" => Command::Echo(admin::Echo::parse_frames(&mut parse)?),
            "select" => Command::Select(admin::Select::parse_frames(&mut parse)?),
            "dbsize" => Command::Dbsize(admin::Dbsize::parse_frames(&mut parse)?),
            "flushdb" => Command::Flushdb(admin::Flush::parse_frames(&mut parse, false)?),
            "flushall" => Command::Flushall(admin::Flush::parse_frames(&mut parse, true)?),
            "time" => Command::Time(admin::Time::parse_frames(&mut parse)?),
            "info" => Command::Info(admin::Info::parse_frames(&mut parse)?),
            "command" => Command::CommandDoc(admin::CommandCmd::parse_frames(&mut parse)?),
            "config" => Command::Config(admin::ConfigCmd::parse_frames(&mut parse)?),
            "debug" => Command::Debug(admin::DebugSleep::parse_frames(&mut parse)?),
            "auth" => Command::Auth(admin::Auth::parse_frames(&mut parse)?),
            "client" => Command::Client(admin::Client::parse_frames(&mut parse)?),
            "save" => Command::Save(save::Save::parse_frames(&mut parse)?),
            "bgsave" => Command::Bgsave(save::Bgsave::parse_frames(&mut parse)?),
            "lastsave" => Command::Lastsave(save::Lastsave::parse_frames(&mut parse)?),

            "subscribe" => Command::Subscribe(pubsub::Subscribe::parse_frames(&mut parse)?),
            "unsubscribe" => Command::Unsubscribe(pubsub::Unsubscribe::parse_frames(&mut parse)?),
            "psubscribe" => Command::Psubscribe(pubsub::Psubscribe::parse_frames(&mut parse)?),
            "punsubscribe" => Command::Punsubscribe(pubsub::Punsubscribe::parse_frames(&mut parse)?),
            "publish" => Command::Publish(pubsub::Publish::parse_frames(&mut parse)?),
            "pubsub" => Command::Pubsub(pubsub::Pubsub::parse_frames(&mut parse)?),

            "multi" => Command::Multi,
            "discard" => Command::Discard,
            "exec" => Command::Exec,
            "quit" => Command::Quit,
            "shutdown" => Command::Shutdown(parse.next_string().ok()),

            _ => return Err(format!("unknown command '{name}'").into()),
        };

        Ok(command)
    }

    /// The command's own name, lowercase, as used in metrics labels and
    /// error messages (e.g. "ERR Can't execute 'subscribe': ...").
    pub fn get_name(&self) -> &str {
        match self {
            Command::Set(_) => "set",
            Command::Get(_) => "get",
            Command::Getset(_) => "getset",
            Command::Getdel(_) => "getdel",
            Command::Getex(_) => "getex",
            Command::Append(_) => "append",
            Command::Strlen(_) => "strlen",
            Command::Getrange(_) => "getrange",
            Command::Setrange(_) => "setrange",
            Command::Incr(_) => "incr",
            Command::Decr(_) => "decr",
            Command::Incrby(_) => "incrby",
            Command::Decrby(_) => "decrby",
            Command::Incrbyfloat(_) => "incrbyfloat",
            Command::Mset(_) => "mset",
            Command::Msetnx(_) => "msetnx",
            Command::Mget(_) => "mget",
            Command::Setnx(_) => "setnx",
            Command::Setex(_) => "setex",
            Command::Psetex(_) => "psetex",

            Command::Lpush(_) => "lpush",
            Command::Rpush(_) => "rpush",
            Command::Lpushx(_) => "lpushx",
            Command::Rpushx(_) => "rpushx",
            Command::Lpop(_) => "lpop",
            Command::Rpop(_) => "rpop",
            Command::Llen(_) => "llen",
            Command::Lrange(_) => "lrange",
            Command::Lindex(_) => "lindex",
            Command::Lset(_) => "lset",
            Command::Linsert(_) => "linsert",
            Command::Lrem(_) => "lrem",
            Command::Ltrim(_) => "ltrim",
            Command::Lpos(_) => "lpos",
            Command::Lmove(_) => "lmove",
            Command::Rpoplpush(_) => "rpoplpush",
            Command::Blpop(_) => "blpop",
            Command::Brpop(_) => "brpop",
            Command::Brpoplpush(_) => "brpoplpush",
            Command::Blmove(_) => "blmove",

            Command::Hset(_) => "hset",
            Command::Hmset(_) => "hmset",
            Command::Hsetnx(_) => "hsetnx",
            Command::Hget(_) => "hget",
            Command::Hmget(_) => "hmget",
            Command::Hgetall(_) => "hgetall",
            Command::Hkeys(_) => "hkeys",
            Command::Hvals(_) => "hvals",
            Command::Hdel(_) => "hdel",
            Command::Hlen(_) => "hlen",
            Command::Hexists(_) => "hexists",
            Command::Hincrby(_) => "hincrby",
            Command::Hincrbyfloat(_) => "hincrbyfloat",
            Command::Hstrlen(_) => "hstrlen",
            Command::Hrandfield(_) => "hrandfield",
            Command::Hscan(_) => "hscan",

            Command::Sadd(_) => "sadd",
            Command::Srem(_) => "srem",
            Command::Sismember(_) => "sismember",
            Command::Smismember(_) => "smismember",
            Command::Scard(_) => "scard",
            Command::Smembers(_) => "smembers",
            Command::Smove(_) => "smove",
            Command::Spop(_) => "spop",
            Command::Srandmember(_) => "srandmember",
            Command::Sunion(_) => "sunion",
            Command::Sinter(_) => "sinter",
            Command::Sdiff(_) => "sdiff",
            Command::Sunionstore(_) => "sunionstore",
            Command::Sinterstore(_) => "sinterstore",
            Command::Sdiffstore(_) => "sdiffstore",
            Command::Sscan(_) => "sscan",

            Command::Zadd(_) => "zadd",
            Command::Zrem(_) => "zrem",
            Command::Zscore(_) => "zscore",
            Command::Zmscore(_) => "zmscore",
            Command::Zincrby(_) => "zincrby",
            Command::Zcard(_) => "zcard",
            Command::Zcount(_) => "zcount",
            Command::Zlexcount(_) => "zlexcount",
            Command::Zrank(_) => "zrank",
            Command::Zrevrank(_) => "zrevrank",
            Command::Zrange(_) => "zrange",
            Command::Zrevrange(_) => "zrevrange",
            Command::Zrangebyscore(_) => "zrangebyscore",
            Command::Zrevrangebyscore(_) => "zrevrangebyscore",
            Command::Zrangebylex(_) => "zrangebylex",
            Command::Zrevrangebylex(_) => "zrevrangebylex",
            Command::Zrangestore(_) => "zrangestore",
            Command::Zrandmember(_) => "zrandmember",
            Command::Zpopmin(_) => "zpopmin",
            Command::Zpopmax(_) => "zpopmax",
            Command::Bzpopmin(_) => "bzpopmin",
            Command::Bzpopmax(_) => "bzpopmax",
            Command::Zremrangebyrank(_) => "zremrangebyrank",
            Command::Zremrangebyscore(_) => "zremrangebyscore",
            Command::Zremrangebylex(_) => "zremrangebylex",
            Command::Zunionstore(_) => "zunionstore",
            Command::Zinterstore(_) => "zinterstore",
            Command::Zdiffstore(_) => "zdiffstore",
            Command::Zunion(_) => "zunion",
            Command::Zinter(_) => "zinter",
            Command::Zdiff(_) => "zdiff",
            Command::Zscan(_) => "zscan",

            Command::Del(_) => "del",
            Command::Exists(_) => "exists",
            Command::Type(_) => "type",
            Command::Rename(_) => "rename",
            Command::Renamenx(_) => "renamenx",
            Command::Randomkey(_) => "randomkey",
            Command::Expire(_) => "expire",
            Command::Pexpire(_) => "pexpire",
            Command::Expireat(_) => "expireat",
            Command::Pexpireat(_) => "pexpireat",
            Command::Ttl(_) => "ttl",
            Command::Pttl(_) => "pttl",
            Command::Persist(_) => "persist",
            Command::Keys(_) => "keys",
            Command::Scan(_) => "scan",

            Command::Ping(_) => "ping",
            Command::Echo(_) => "echo",
            Command::Select(_) => "select",
            Command::Dbsize(_) => "dbsize",
            Command::Flushdb(_) => "flushdb",
            Command::Flushall(_) => "flushall",
            Command::Time(_) => "time",
            Command::Info(_) => "info",
            Command::CommandDoc(_) => "command",
            Command::Config(_) => "config",
            Command::Debug(_) => "debug",
            Command::Auth(_) => "auth",
            Command::Client(_) => "client",
            Command::Save(_) => "save",
            Command::Bgsave(_) => "bgsave",
            Command::Lastsave(_) => "lastsave",

            Command::Subscribe(_) => "subscribe",
            Command::Unsubscribe(_) => "unsubscribe",
            Command::Psubscribe(_) => "psubscribe",
            Command::Punsubscribe(_) => "punsubscribe",
            Command::Publish(_) => "publish",
            Command::Pubsub(_) => "pubsub",

            Command::Multi => "multi",
            Command::Discard => "discard",
            Command::Exec => "exec",
            Command::Quit => "quit",
            Command::Shutdown(_) => "shutdown",
        }
    }

    /// Whether this command may run on a connection that currently has an
    /// active channel or pattern subscription (spec.md: only the
    /// subscription-management commands, PING, and QUIT are allowed).
    pub fn allowed_while_subscribed(&self) -> bool {
        matches!(
            self,
            Command::Subscribe(_)
                | Command::Unsubscribe(_)
                | Command::Psubscribe(_)
                | Command::Punsubscribe(_)
                | Command::Ping(_)
                | Command::Quit
        )
    }

    /// Runs the command against `ctx`, producing the RESP reply to write
    /// back to the client. Transaction control and connection lifecycle
    /// commands (MULTI/EXEC/DISCARD/QUIT/SHUTDOWN) are handled directly by
    /// `server::Handler::handle_frame` and never reach this method.
    pub fn apply(&self, ctx: &mut Context) -> Frame {
        let is_write = self.is_write();
        let reply = match self {
            Command::Set(cmd) => cmd.apply(ctx),
            Command::Get(cmd) => cmd.apply(ctx),
            Command::Getset(cmd) => cmd.apply(ctx),
            Command::Getdel(cmd) => cmd.apply(ctx),
            Command::Getex(cmd) => cmd.apply(ctx),
            Command::Append(cmd) => cmd.apply(ctx),
            Command::Strlen(cmd) => cmd.apply(ctx),
            Command::Getrange(cmd) => cmd.apply(ctx),
            Command::Setrange(cmd) => cmd.apply(ctx),
            Command::Incr(cmd) => cmd.apply(ctx),
            Command::Decr(cmd) => cmd.apply(ctx),
            Command::Incrby(cmd) => cmd.apply(ctx),
            Command::Decrby(cmd) => cmd.apply(ctx),
            Command::Incrbyfloat(cmd) => cmd.apply(ctx),
            Command::Mset(cmd) => cmd.apply(ctx),
            Command::Msetnx(cmd) => cmd.apply(ctx),
            Command::Mget(cmd) => cmd.apply(ctx),
            Command::Setnx(cmd) => cmd.apply(ctx),
            Command::Setex(cmd) => cmd.apply(ctx),
            Command::Psetex(cmd) => cmd.apply(ctx),

            Command::Lpush(cmd) => cmd.apply(ctx),
            Command::Rpush(cmd) => cmd.apply(ctx),
            Command::Lpushx(cmd) => cmd.apply(ctx),
            Command::Rpushx(cmd) => cmd.apply(ctx),
            Command::Lpop(cmd) => cmd.apply(ctx),
            Command::Rpop(cmd) => cmd.apply(ctx),
            Command::Llen(cmd) => cmd.apply(ctx),
            Command::Lrange(cmd) => cmd.apply(ctx),
            Command::Lindex(cmd) => cmd.apply(ctx),
            Command::Lset(cmd) => cmd.apply(ctx),
            Command::Linsert(cmd) => cmd.apply(ctx),
            Command::Lrem(cmd) => cmd.apply(ctx),
            Command::Ltrim(cmd) => cmd.apply(ctx),
            Command::Lpos(cmd) => cmd.apply(ctx),
            Command::Lmove(cmd) => cmd.apply(ctx),
            Command::Rpoplpush(cmd) => cmd.apply(ctx),
            Command::Blpop(cmd) => cmd.apply(ctx),
            Command::Brpop(cmd) => cmd.apply(ctx),
            Command::Brpoplpush(cmd) => cmd.apply(ctx),
            Command::Blmove(cmd) => cmd.apply(ctx),

            Command::Hset(cmd) => cmd.apply(ctx),
            Command::Hmset(cmd) => cmd.apply(ctx),
            Command::Hsetnx(cmd) => cmd.apply(ctx),
            Command::Hget(cmd) => cmd.apply(ctx),
            Command::Hmget(cmd) => cmd.apply(ctx),
            Command::Hgetall(cmd) => cmd.apply(ctx),
            Command::Hkeys(cmd) => cmd.apply(ctx),
            Command::Hvals(cmd) => cmd.apply(ctx),
            Command::Hdel(cmd) => cmd.apply(ctx),
            Command::Hlen(cmd) => cmd.apply(ctx),
            Command::Hexists(cmd) => cmd.apply(ctx),
            Command::Hincrby(cmd) => cmd.apply(ctx),
            Command::Hincrbyfloat(cmd) => cmd.apply(ctx),
            Command::Hstrlen(cmd) => cmd.apply(ctx),
            Command::Hrandfield(cmd) => cmd.apply(ctx),
            Command::Hscan(cmd) => cmd.apply(ctx),

            Command::Sadd(cmd) => cmd.apply(ctx),
            Command::Srem(cmd) => cmd.apply(ctx),
            Command::Sismember(cmd) => cmd.apply(ctx),
            Command::Smismember(cmd) => cmd.apply(ctx),
            Command::Scard(cmd) => cmd.apply(ctx),
            Command::Smembers(cmd) => cmd.apply(ctx),
            Command::Smove(cmd) => cmd.apply(ctx),
            Command::Spop(cmd) => cmd.apply(ctx),
            Command::Srandmember(cmd) => cmd.apply(ctx),
            Command::Sunion(cmd) => cmd.apply(ctx),
            Command::Sinter(cmd) => cmd.apply(ctx),
            Command::Sdiff(cmd) => cmd.apply(ctx),
            Command::Sunionstore(cmd) => cmd.apply(ctx),
            Command::Sinterstore(cmd) => cmd.apply(ctx),
            Command::Sdiffstore(cmd) => cmd.apply(ctx),
            Command::Sscan(cmd) => cmd.apply(ctx),

            Command::Zadd(cmd) => cmd.apply(ctx),
            Command::Zrem(cmd) => cmd.apply(ctx),
            Command::Zscore(cmd) => cmd.apply(ctx),
            Command::Zmscore(cmd) => cmd.apply(ctx),
            Command::Zincrby(cmd) => cmd.apply(ctx),
            Command::Zcard(cmd) => cmd.apply(ctx),
            Command::Zcount(cmd) => cmd.apply(ctx),
            Command::Zlexcount(cmd) => cmd.apply(ctx),
            Command::Zrank(cmd) => cmd.apply(ctx),
            Command::Zrevrank(cmd) => cmd.apply(ctx),
            Command::Zrange(cmd) => cmd.apply(ctx),
            Command::Zrevrange(cmd) => cmd.apply(ctx),
            Command::Zrangebyscore(cmd) => cmd.apply(ctx),
            Command::Zrevrangebyscore(cmd) => cmd.apply(ctx),
            Command::Zrangebylex(cmd) => cmd.apply(ctx),
            Command::Zrevrangebylex(cmd) => cmd.apply(ctx),
            Command::Zrangestore(cmd) => cmd.apply(ctx),
            Command::Zrandmember(cmd) => cmd.apply(ctx),
            Command::Zpopmin(cmd) => cmd.apply(ctx),
            Command::Zpopmax(cmd) => cmd.apply(ctx),
            Command::Bzpopmin(cmd) => cmd.apply(ctx),
            Command::Bzpopmax(cmd) => cmd.apply(ctx),
            Command::Zremrangebyrank(cmd) => cmd.apply(ctx),
            Command::Zremrangebyscore(cmd) => cmd.apply(ctx),
            Command::Zremrangebylex(cmd) => cmd.apply(ctx),
            Command::Zunionstore(cmd) => cmd.apply(ctx),
            Command::Zinterstore(cmd) => cmd.apply(ctx),
            Command::Zdiffstore(cmd) => cmd.apply(ctx),
            Command::Zunion(cmd) => cmd.apply(ctx),
            Command::Zinter(cmd) => cmd.apply(ctx),
            Command::Zdiff(cmd) => cmd.apply(ctx),
            Command::Zscan(cmd) => cmd.apply(ctx),

            Command::Del(cmd) => cmd.apply(ctx),
            Command::Exists(cmd) => cmd.apply(ctx),
            Command::Type(cmd) => cmd.apply(ctx),
            Command::Rename(cmd) => cmd.apply(ctx),
            Command::Renamenx(cmd) => cmd.apply(ctx),
            Command::Randomkey(cmd) => cmd.apply(ctx),
            Command::Expire(cmd) => cmd.apply(ctx),
            Command::Pexpire(cmd) => cmd.apply(ctx),
            Command::Expireat(cmd) => cmd.apply(ctx),
            Command::Pexpireat(cmd) => cmd.apply(ctx),
            Command::Ttl(cmd) => cmd.apply(ctx),
            Command::Pttl(cmd) => cmd.apply(ctx),
            Command::Persist(cmd) => cmd.apply(ctx),
            Command::Keys(cmd) => cmd.apply(ctx),
            Command::Scan(cmd) => cmd.apply(ctx),

            Command::Ping(cmd) => cmd.apply(ctx),
            Command::Echo(cmd) => cmd.apply(ctx),
            Command::Select(cmd) => cmd.apply(ctx),
            Command::Dbsize(cmd) => cmd.apply(ctx),
            Command::Flushdb(cmd) => cmd.apply(ctx),
            Command::Flushall(cmd) => cmd.apply(ctx),
            Command::Time(cmd) => cmd.apply(ctx),
            Command::Info(cmd) => cmd.apply(ctx),
            Command::CommandDoc(cmd) => cmd.apply(ctx),
            Command::Config(cmd) => cmd.apply(ctx),
            Command::Debug(cmd) => cmd.apply(ctx),
            Command::Auth(cmd) => cmd.apply(ctx),
            Command::Client(cmd) => cmd.apply(ctx),
            Command::Save(cmd) => cmd.apply(ctx),
            Command::Bgsave(cmd) => cmd.apply(ctx),
            Command::Lastsave(cmd) => cmd.apply(ctx),

            Command::Subscribe(cmd) => cmd.apply(ctx),
            Command::Unsubscribe(cmd) => cmd.apply(ctx),
            Command::Psubscribe(cmd) => cmd.apply(ctx),
            Command::Punsubscribe(cmd) => cmd.apply(ctx),
            Command::Publish(cmd) => cmd.apply(ctx),
            Command::Pubsub(cmd) => cmd.apply(ctx),

            Command::Multi | Command::Discard | Command::Exec | Command::Quit | Command::Shutdown(_) => {
                unreachable!("transaction and connection control commands are handled in server::Handler")
            }
        };

        if is_write && !matches!(reply, Frame::Error(_)) {
            admin::mark_dirty();
        }
        reply
    }

    /// Commands that mutate the keyspace, used to drive the periodic
    /// snapshot's dirty-key trigger (spec.md §4.7).
    fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Set(_)
                | Command::Getset(_)
                | Command::Getdel(_)
                | Command::Getex(_)
                | Command::Append(_)
                | Command::Setrange(_)
                | Command::Incr(_)
                | Command::Decr(_)
                | Command::Incrby(_)
                | Command::Decrby(_)
                | Command::Incrbyfloat(_)
                | Command::Mset(_)
                | Command::Msetnx(_)
                | Command::Setnx(_)
                | Command::Setex(_)
                | Command::Psetex(_)
                | Command::Lpush(_)
                | Command::Rpush(_)
                | Command::Lpushx(_)
                | Command::Rpushx(_)
                | Command::Lpop(_)
                | Command::Rpop(_)
                | Command::Lset(_)
                | Command::Linsert(_)
                | Command::Lrem(_)
                | Command::Ltrim(_)
                | Command::Lmove(_)
                | Command::Rpoplpush(_)
                | Command::Blpop(_)
                | Command::Brpop(_)
                | Command::Brpoplpush(_)
                | Command::Blmove(_)
                | Command::Hset(_)
                | Command::Hmset(_)
                | Command::Hsetnx(_)
                | Command::Hdel(_)
                | Command::Hincrby(_)
                | Command::Hincrbyfloat(_)
                | Command::Sadd(_)
                | Command::Srem(_)
                | Command::Smove(_)
                | Command::Spop(_)
                | Command::Sunionstore(_)
                | Command::Sinterstore(_)
                | Command::Sdiffstore(_)
                | Command::Zadd(_)
                | Command::Zrem(_)
                | Command::Zincrby(_)
                | Command::Zpopmin(_)
                | Command::Zpopmax(_)
                | Command::Bzpopmin(_)
                | Command::Bzpopmax(_)
                | Command::Zremrangebyrank(_)
                | Command::Zremrangebyscore(_)
                | Command::Zremrangebylex(_)
                | Command::Zunionstore(_)
                | Command::Zinterstore(_)
                | Command::Zdiffstore(_)
                | Command::Zrangestore(_)
                | Command::Del(_)
                | Command::Rename(_)
                | Command::Renamenx(_)
                | Command::Expire(_)
                | Command::Pexpire(_)
                | Command::Expireat(_)
                | Command::Pexpireat(_)
                | Command::Persist(_)
                | Command::Flushdb(_)
                | Command::Flushall(_)
        )
    }
}
