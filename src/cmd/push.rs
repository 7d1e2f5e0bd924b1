use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Shared implementation of LPUSH, RPUSH, LPUSHX and RPUSHX. The `X` variants
/// differ only in refusing to auto-vivify a missing key.
#[derive(Debug)]
pub struct Push {
    key: String,
    values: Vec<Bytes>,
    side: Side,
    require_existing: bool,
}

impl Push {
    pub(crate) fn parse_frames(parse: &mut Parse, side: &str, require_existing: bool) -> crate::Result<Push> {
        let key = parse.next_string()?;
        let mut values = vec![parse.next_bytes()?];
        while parse.has_next() {
            values.push(parse.next_bytes()?);
        }
        let side = if side.eq_ignore_ascii_case("left") {
            Side::Left
        } else {
            Side::Right
        };
        Ok(Push {
            key,
            values,
            side,
            require_existing,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if self.require_existing && !g.exists(db, self.key.as_bytes()) {
            return Frame::Integer(0);
        }

        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::List(VecDeque::new()));
        let list = match value {
            Value::List(l) => l,
            _ => return resp_wrong_type(),
        };

        for v in &self.values {
            match self.side {
                Side::Left => list.push_front(v.clone()),
                Side::Right => list.push_back(v.clone()),
            }
        }
        let len = list.len() as i64;
        Frame::Integer(len)
    }
}
