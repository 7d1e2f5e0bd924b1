use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `HMGET key field [field ...]`.
#[derive(Debug)]
pub struct Hmget {
    key: String,
    fields: Vec<Bytes>,
}

impl Hmget {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hmget> {
        let key = parse.next_string()?;
        let mut fields = vec![parse.next_bytes()?];
        while parse.has_next() {
            fields.push(parse.next_bytes()?);
        }
        Ok(Hmget { key, fields })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let hash = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Hash(h)) => Some(h),
            Some(_) => return resp_wrong_type(),
            None => None,
        };
        let out = self
            .fields
            .iter()
            .map(|f| match hash.and_then(|h| h.get(f.as_ref())) {
                Some(v) => Frame::Bulk(v.clone()),
                None => Frame::Null,
            })
            .collect();
        Frame::Array(out)
    }
}
