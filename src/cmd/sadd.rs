use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;
use std::collections::HashSet;

/// `SADD key member [member ...]`.
#[derive(Debug)]
pub struct Sadd {
    key: String,
    members: Vec<Bytes>,
}

impl Sadd {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Sadd> {
        let key = parse.next_string()?;
        let mut members = vec![parse.next_bytes()?];
        while parse.has_next() {
            members.push(parse.next_bytes()?);
        }
        Ok(Sadd { key, members })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::Set(HashSet::new()));
        let set = match value {
            Value::Set(s) => s,
            _ => return resp_wrong_type(),
        };
        let mut added = 0i64;
        for member in &self.members {
            if set.insert(member.clone()) {
                added += 1;
            }
        }
        Frame::Integer(added)
    }
}
