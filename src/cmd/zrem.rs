use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `ZREM key member [member ...]`.
#[derive(Debug)]
pub struct Zrem {
    key: String,
    members: Vec<Bytes>,
}

impl Zrem {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zrem> {
        let key = parse.next_string()?;
        let mut members = vec![parse.next_bytes()?];
        while parse.has_next() {
            members.push(parse.next_bytes()?);
        }
        Ok(Zrem { key, members })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let zset = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => z,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        };
        let removed = self.members.iter().filter(|m| zset.remove(m)).count();
        g.remove_if_empty(db, self.key.as_bytes());
        Frame::Integer(removed as i64)
    }
}
