use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `HGET key field`.
#[derive(Debug)]
pub struct Hget {
    key: String,
    field: Bytes,
}

impl Hget {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hget> {
        let key = parse.next_string()?;
        let field = parse.next_bytes()?;
        Ok(Hget { key, field })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Hash(h)) => match h.get(self.field.as_ref()) {
                Some(v) => Frame::Bulk(v.clone()),
                None => Frame::Null,
            },
            Some(_) => resp_wrong_type(),
            None => Frame::Null,
        }
    }
}
