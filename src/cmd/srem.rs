use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `SREM key member [member ...]`.
#[derive(Debug)]
pub struct Srem {
    key: String,
    members: Vec<Bytes>,
}

impl Srem {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Srem> {
        let key = parse.next_string()?;
        let mut members = vec![parse.next_bytes()?];
        while parse.has_next() {
            members.push(parse.next_bytes()?);
        }
        Ok(Srem { key, members })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let set = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::Set(s)) => s,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        };
        let mut removed = 0i64;
        for member in &self.members {
            if set.remove(member.as_ref()) {
                removed += 1;
            }
        }
        g.remove_if_empty(db, self.key.as_bytes());
        Frame::Integer(removed)
    }
}
