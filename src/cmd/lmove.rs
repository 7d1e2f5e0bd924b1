use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Shared implementation of RPOPLPUSH and LMOVE: pop from one end of the
/// source list and push to one end of the destination list (which may be the
/// same key), atomically.
#[derive(Debug)]
pub struct Lmove {
    source: String,
    destination: String,
    from: Side,
    to: Side,
}

impl Lmove {
    /// RPOPLPUSH always pops from the right and pushes to the left.
    pub(crate) fn parse_frames_rpoplpush(parse: &mut Parse) -> crate::Result<Lmove> {
        let source = parse.next_string()?;
        let destination = parse.next_string()?;
        Ok(Lmove {
            source,
            destination,
            from: Side::Right,
            to: Side::Left,
        })
    }

    pub(crate) fn parse_frames_lmove(parse: &mut Parse) -> crate::Result<Lmove> {
        let source = parse.next_string()?;
        let destination = parse.next_string()?;
        let from = parse_side(&parse.next_string()?)?;
        let to = parse_side(&parse.next_string()?)?;
        Ok(Lmove {
            source,
            destination,
            from,
            to,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        match g.get(db, self.source.as_bytes()) {
            Some(Value::List(_)) => {}
            Some(_) => return resp_wrong_type(),
            None => return Frame::Null,
        }
        match g.get(db, self.destination.as_bytes()) {
            Some(Value::List(_)) | None => {}
            Some(_) => return resp_wrong_type(),
        }

        let value = {
            let list = match g.get_mut(db, self.source.as_bytes()) {
                Some(Value::List(l)) => l,
                _ => unreachable!("checked above"),
            };
            let popped = match self.from {
                Side::Left => list.pop_front(),
                Side::Right => list.pop_back(),
            };
            match popped {
                Some(v) => v,
                None => return Frame::Null,
            }
        };
        g.remove_if_empty(db, self.source.as_bytes());

        let dest_list = match g.get_or_insert_with(db, self.destination.as_bytes(), || Value::List(VecDeque::new())) {
            Value::List(l) => l,
            _ => unreachable!("checked above"),
        };
        match self.to {
            Side::Left => dest_list.push_front(value.clone()),
            Side::Right => dest_list.push_back(value.clone()),
        }
        Frame::Bulk(value)
    }
}

fn parse_side(s: &str) -> crate::Result<Side> {
    match s.to_uppercase().as_str() {
        "LEFT" => Ok(Side::Left),
        "RIGHT" => Ok(Side::Right),
        _ => Err("ERR syntax error".into()),
    }
}
