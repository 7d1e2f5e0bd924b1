use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_invalid_arguments, resp_wrong_type};
use crate::Frame;

use bytes::{Bytes, BytesMut};

/// `SETRANGE key offset value`: overwrite part of a string starting at
/// `offset`, zero-padding with NUL bytes if the string is shorter.
#[derive(Debug)]
pub struct Setrange {
    key: String,
    offset: i64,
    value: Bytes,
}

impl Setrange {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Setrange> {
        let key = parse.next_string()?;
        let offset = parse.next_int_signed()?;
        let value = parse.next_bytes()?;
        Ok(Setrange { key, offset, value })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        if self.offset < 0 {
            return resp_invalid_arguments();
        }
        let offset = self.offset as usize;
        if offset + self.value.len() > crate::frame::MAX_BULK_LEN {
            return resp_invalid_arguments();
        }

        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let existing = match g.get(db, self.key.as_bytes()) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return resp_wrong_type(),
            None => Bytes::new(),
        };

        if self.value.is_empty() {
            return Frame::Integer(existing.len() as i64);
        }

        let mut buf = BytesMut::from(&existing[..]);
        if buf.len() < offset {
            buf.resize(offset, 0);
        }
        if buf.len() < offset + self.value.len() {
            buf.resize(offset + self.value.len(), 0);
        }
        buf[offset..offset + self.value.len()].copy_from_slice(&self.value);

        let new_len = buf.len();
        g.put(db, Bytes::copy_from_slice(self.key.as_bytes()), Value::String(buf.freeze()));
        Frame::Integer(new_len as i64)
    }
}
