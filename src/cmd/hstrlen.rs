use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `HSTRLEN key field`.
#[derive(Debug)]
pub struct Hstrlen {
    key: String,
    field: Bytes,
}

impl Hstrlen {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hstrlen> {
        let key = parse.next_string()?;
        let field = parse.next_bytes()?;
        Ok(Hstrlen { key, field })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Hash(h)) => Frame::Integer(h.get(self.field.as_ref()).map_or(0, |v| v.len() as i64)),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
