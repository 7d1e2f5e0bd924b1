use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_not_int, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;

/// Shared implementation of INCR, DECR, INCRBY and DECRBY: all four parse a
/// key (and, for the `BY` variants, a signed delta) and apply it to the
/// string value as a base-10 64-bit integer.
#[derive(Debug)]
pub struct IncrDecr {
    key: String,
    delta: i64,
}

impl IncrDecr {
    pub(crate) fn parse_frames(parse: &mut Parse, by: bool, negate: bool) -> crate::Result<IncrDecr> {
        let key = parse.next_string()?;
        let mut delta = if by { parse.next_int_signed()? } else { 1 };
        if negate {
            delta = delta
                .checked_neg()
                .ok_or("ERR decrement would overflow")?;
        }
        Ok(IncrDecr { key, delta })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if let Some(value) = g.get_mut(db, self.key.as_bytes()) {
            let s = match value {
                Value::String(s) => s,
                _ => return resp_wrong_type(),
            };
            let current: i64 = match std::str::from_utf8(s).ok().and_then(|s| s.parse().ok()) {
                Some(v) => v,
                None => return resp_not_int(),
            };
            let updated = match current.checked_add(self.delta) {
                Some(v) => v,
                None => return Frame::Error("ERR increment or decrement would overflow".into()),
            };
            *s = Bytes::from(updated.to_string());
            return Frame::Integer(updated);
        }

        let updated = self.delta;
        g.put(
            db,
            Bytes::copy_from_slice(self.key.as_bytes()),
            Value::String(Bytes::from(updated.to_string())),
        );
        Frame::Integer(updated)
    }
}
