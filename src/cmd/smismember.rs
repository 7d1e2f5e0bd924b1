use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `SMISMEMBER key member [member ...]`.
#[derive(Debug)]
pub struct Smismember {
    key: String,
    members: Vec<Bytes>,
}

impl Smismember {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Smismember> {
        let key = parse.next_string()?;
        let mut members = vec![parse.next_bytes()?];
        while parse.has_next() {
            members.push(parse.next_bytes()?);
        }
        Ok(Smismember { key, members })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let set = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Set(s)) => Some(s),
            Some(_) => return resp_wrong_type(),
            None => None,
        };
        let out = self
            .members
            .iter()
            .map(|m| Frame::Integer(set.is_some_and(|s| s.contains(m.as_ref())) as i64))
            .collect();
        Frame::Array(out)
    }
}
