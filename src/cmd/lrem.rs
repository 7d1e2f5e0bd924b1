use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `LREM key count value`: remove occurrences of `value`. Positive `count`
/// removes from the head, negative from the tail, zero removes all.
#[derive(Debug)]
pub struct Lrem {
    key: String,
    count: i64,
    value: Bytes,
}

impl Lrem {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Lrem> {
        let key = parse.next_string()?;
        let count = parse.next_int_signed()?;
        let value = parse.next_bytes()?;
        Ok(Lrem { key, count, value })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let list = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        };

        let mut removed = 0i64;
        if self.count >= 0 {
            let limit = if self.count == 0 { i64::MAX } else { self.count };
            let mut kept = std::collections::VecDeque::with_capacity(list.len());
            for item in list.drain(..) {
                if removed < limit && item == self.value {
                    removed += 1;
                } else {
                    kept.push_back(item);
                }
            }
            *list = kept;
        } else {
            let limit = -self.count;
            let mut kept = std::collections::VecDeque::with_capacity(list.len());
            for item in list.drain(..).rev() {
                if removed < limit && item == self.value {
                    removed += 1;
                } else {
                    kept.push_front(item);
                }
            }
            *list = kept;
        }

        g.remove_if_empty(db, self.key.as_bytes());
        Frame::Integer(removed)
    }
}
