use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_not_int, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;
use std::collections::HashMap;

/// `HINCRBY key field delta`.
#[derive(Debug)]
pub struct Hincrby {
    key: String,
    field: Bytes,
    delta: i64,
}

impl Hincrby {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hincrby> {
        let key = parse.next_string()?;
        let field = parse.next_bytes()?;
        let delta = parse.next_int_signed()?;
        Ok(Hincrby { key, field, delta })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::Hash(HashMap::new()));
        let hash = match value {
            Value::Hash(h) => h,
            _ => return resp_wrong_type(),
        };

        let current: i64 = match hash.get(self.field.as_ref()) {
            Some(v) => match std::str::from_utf8(v).ok().and_then(|s| s.parse().ok()) {
                Some(v) => v,
                None => return resp_not_int(),
            },
            None => 0,
        };
        let updated = match current.checked_add(self.delta) {
            Some(v) => v,
            None => return Frame::Error("ERR increment or decrement would overflow".into()),
        };
        hash.insert(self.field.clone(), Bytes::from(updated.to_string()));
        Frame::Integer(updated)
    }
}
