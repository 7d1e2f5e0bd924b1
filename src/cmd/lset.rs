use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_err, resp_ok, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;

/// `LSET key index value`: errors (rather than nil) on an out-of-range index.
#[derive(Debug)]
pub struct Lset {
    key: String,
    index: i64,
    value: Bytes,
}

impl Lset {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Lset> {
        let key = parse.next_string()?;
        let index = parse.next_int_signed()?;
        let value = parse.next_bytes()?;
        Ok(Lset { key, index, value })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let list = match g.get_mut(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return resp_err("no such key"),
        };
        let len = list.len() as i64;
        let idx = if self.index < 0 { len + self.index } else { self.index };
        if idx < 0 || idx >= len {
            return resp_err("index out of range");
        }
        list[idx as usize] = self.value.clone();
        resp_ok()
    }
}
