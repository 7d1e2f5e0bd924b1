use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `SISMEMBER key member`.
#[derive(Debug)]
pub struct Sismember {
    key: String,
    member: Bytes,
}

impl Sismember {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Sismember> {
        let key = parse.next_string()?;
        let member = parse.next_bytes()?;
        Ok(Sismember { key, member })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Set(s)) => Frame::Integer(s.contains(self.member.as_ref()) as i64),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
