use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;
use std::collections::HashSet;

/// `SMOVE source destination member`.
#[derive(Debug)]
pub struct Smove {
    source: String,
    destination: String,
    member: Bytes,
}

impl Smove {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Smove> {
        let source = parse.next_string()?;
        let destination = parse.next_string()?;
        let member = parse.next_bytes()?;
        Ok(Smove {
            source,
            destination,
            member,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        match g.get(db, self.source.as_bytes()) {
            Some(Value::Set(_)) => {}
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        }
        match g.get(db, self.destination.as_bytes()) {
            Some(Value::Set(_)) | None => {}
            Some(_) => return resp_wrong_type(),
        }

        let removed = match g.get_mut(db, self.source.as_bytes()) {
            Some(Value::Set(s)) => s.remove(self.member.as_ref()),
            _ => unreachable!("checked above"),
        };
        if !removed {
            return Frame::Integer(0);
        }
        g.remove_if_empty(db, self.source.as_bytes());

        let dest = g.get_or_insert_with(db, self.destination.as_bytes(), || Value::Set(HashSet::new()));
        match dest {
            Value::Set(s) => {
                s.insert(self.member.clone());
            }
            _ => unreachable!("checked above"),
        }
        Frame::Integer(1)
    }
}
