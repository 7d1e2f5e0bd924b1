use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `GETSET key value`: set key to value, returning the old string value (or
/// nil if it did not exist). Deprecated alias of `SET ... GET` kept for
/// client-library compatibility.
#[derive(Debug)]
pub struct Getset {
    key: String,
    value: Bytes,
}

impl Getset {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Getset> {
        let key = parse.next_string()?;
        let value = parse.next_bytes()?;
        Ok(Getset { key, value })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let old = match g.get(db, self.key.as_bytes()) {
            Some(Value::String(s)) => Frame::Bulk(s.clone()),
            Some(_) => return resp_wrong_type(),
            None => Frame::Null,
        };
        g.put(db, Bytes::copy_from_slice(self.key.as_bytes()), Value::String(self.value.clone()));
        old
    }
}
