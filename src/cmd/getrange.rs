use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `GETRANGE key start end`: substring with Redis-style negative indices,
/// both bounds inclusive.
#[derive(Debug)]
pub struct Getrange {
    key: String,
    start: i64,
    end: i64,
}

impl Getrange {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Getrange> {
        let key = parse.next_string()?;
        let start = parse.next_int_signed()?;
        let end = parse.next_int_signed()?;
        Ok(Getrange { key, start, end })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let s = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return resp_wrong_type(),
            None => return Frame::Bulk(Bytes::new()),
        };
        let len = s.len() as i64;
        if len == 0 {
            return Frame::Bulk(Bytes::new());
        }
        let mut start = if self.start < 0 { (len + self.start).max(0) } else { self.start };
        let mut end = if self.end < 0 { len + self.end } else { self.end };
        if end >= len {
            end = len - 1;
        }
        if start > end || start >= len || end < 0 {
            return Frame::Bulk(Bytes::new());
        }
        if start < 0 {
            start = 0;
        }
        Frame::Bulk(s.slice(start as usize..=end as usize))
    }
}
