use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::{Bytes, BytesMut};

/// `APPEND key value`: append `value` to the string at `key`, creating it if
/// absent. Returns the length of the string after the append.
#[derive(Debug)]
pub struct Append {
    key: String,
    value: Bytes,
}

impl Append {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Append> {
        let key = parse.next_string()?;
        let value = parse.next_bytes()?;
        Ok(Append { key, value })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::String(s)) => {
                let mut buf = BytesMut::from(&s[..]);
                buf.extend_from_slice(&self.value);
                let new_len = buf.len();
                *s = buf.freeze();
                Frame::Integer(new_len as i64)
            }
            Some(_) => resp_wrong_type(),
            None => {
                let len = self.value.len();
                g.put(db, Bytes::copy_from_slice(self.key.as_bytes()), Value::String(self.value.clone()));
                Frame::Integer(len as i64)
            }
        }
    }
}
