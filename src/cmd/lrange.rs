use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `LRANGE key start stop`: inclusive, Redis-style negative indices.
#[derive(Debug)]
pub struct Lrange {
    key: String,
    start: i64,
    stop: i64,
}

impl Lrange {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Lrange> {
        let key = parse.next_string()?;
        let start = parse.next_int_signed()?;
        let stop = parse.next_int_signed()?;
        Ok(Lrange { key, start, stop })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let list = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Array(Vec::new()),
        };
        match normalize_range(self.start, self.stop, list.len()) {
            Some((start, stop)) => Frame::Array(
                list.iter()
                    .skip(start)
                    .take(stop - start + 1)
                    .map(|v| Frame::Bulk(v.clone()))
                    .collect(),
            ),
            None => Frame::Array(Vec::new()),
        }
    }
}

/// Clamps a Redis-style `start`/`stop` pair (negative indices count from the
/// end) to `[0, len)`. Returns `None` when the resulting range is empty.
pub(crate) fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let mut start = if start < 0 { (len + start).max(0) } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    if stop >= len {
        stop = len - 1;
    }
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    if start < 0 {
        start = 0;
    }
    Some((start as usize, stop as usize))
}
