use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{resp_invalid_arguments, resp_wrong_type};
use crate::Frame;

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Shared implementation of LPOP and RPOP, both with an optional `count`.
/// Without `count`, pops a single element and replies with a bulk string (or
/// nil). With `count`, replies with an array (possibly empty, never nil).
#[derive(Debug)]
pub struct Pop {
    key: String,
    side: Side,
    count: Option<i64>,
}

impl Pop {
    /// Builds a single-element, no-count pop used by the BLPOP/BRPOP probes.
    pub(crate) fn probe(key: String, left: bool) -> Pop {
        Pop {
            key,
            side: if left { Side::Left } else { Side::Right },
            count: None,
        }
    }

    pub(crate) fn parse_frames(parse: &mut Parse, side: &str) -> crate::Result<Pop> {
        let key = parse.next_string()?;
        let side = if side.eq_ignore_ascii_case("left") {
            Side::Left
        } else {
            Side::Right
        };
        let count = match parse.next_int_signed() {
            Ok(n) => Some(n),
            Err(ParseError::EndOfStream) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Pop { key, side, count })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if let Some(count) = self.count {
            if count < 0 {
                return resp_invalid_arguments();
            }
            let list = match g.get_mut(db, self.key.as_bytes()) {
                Some(Value::List(l)) => l,
                Some(_) => return resp_wrong_type(),
                None => return Frame::Null,
            };
            let mut out = Vec::new();
            for _ in 0..count {
                let popped = match self.side {
                    Side::Left => list.pop_front(),
                    Side::Right => list.pop_back(),
                };
                match popped {
                    Some(v) => out.push(Frame::Bulk(v)),
                    None => break,
                }
            }
            g.remove_if_empty(db, self.key.as_bytes());
            return Frame::Array(out);
        }

        let list = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Null,
        };
        let popped = match self.side {
            Side::Left => list.pop_front(),
            Side::Right => list.pop_back(),
        };
        g.remove_if_empty(db, self.key.as_bytes());
        match popped {
            Some(v) => Frame::Bulk(v),
            None => Frame::Null,
        }
    }
}
