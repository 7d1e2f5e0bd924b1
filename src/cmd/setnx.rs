use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::now_timestamp_in_millis;
use crate::Frame;

use bytes::Bytes;

/// `SETEX`/`PSETEX key seconds|ms value`: like `SET key value EX/PX ...`
/// but the expiry is mandatory and comes before the value on the wire.
#[derive(Debug)]
pub struct Setex {
    key: String,
    value: Bytes,
    expire_at_ms: i64,
}

impl Setex {
    pub(crate) fn parse_frames(parse: &mut Parse, millis: bool) -> crate::Result<Setex> {
        let key = parse.next_string()?;
        let amount = parse.next_int()? as i64;
        let value = parse.next_bytes()?;
        if amount <= 0 {
            return Err(if millis {
                "invalid expire time in 'psetex' command".into()
            } else {
                "invalid expire time in 'setex' command".into()
            });
        }
        let delta = if millis { amount } else { amount * 1000 };
        Ok(Setex {
            key,
            value,
            expire_at_ms: now_timestamp_in_millis() + delta,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        g.put(db, Bytes::copy_from_slice(self.key.as_bytes()), Value::String(self.value.clone()));
        g.set_expiry(db, self.key.as_bytes(), self.expire_at_ms);
        crate::utils::resp_ok()
    }
}

/// `SETNX key value`: only set if the key does not already exist.
#[derive(Debug)]
pub struct Setnx {
    key: String,
    value: Bytes,
}

impl Setnx {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Setnx> {
        let key = parse.next_string()?;
        let value = parse.next_bytes()?;
        Ok(Setnx { key, value })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        if g.exists(db, self.key.as_bytes()) {
            return Frame::Integer(0);
        }
        g.put(db, Bytes::copy_from_slice(self.key.as_bytes()), Value::String(self.value.clone()));
        Frame::Integer(1)
    }
}
