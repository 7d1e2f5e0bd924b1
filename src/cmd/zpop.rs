use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// Shared implementation of ZPOPMIN and ZPOPMAX, both with an optional
/// `count`.
#[derive(Debug)]
pub struct Zpop {
    key: String,
    max: bool,
    count: i64,
}

impl Zpop {
    /// Builds a single-element pop used by the BZPOPMIN/BZPOPMAX probes.
    pub(crate) fn single(key: String, max: bool) -> Zpop {
        Zpop { key, max, count: 1 }
    }

    pub(crate) fn parse_frames(parse: &mut Parse, max: bool) -> crate::Result<Zpop> {
        let key = parse.next_string()?;
        let count = match parse.next_int_signed() {
            Ok(n) => n,
            Err(ParseError::EndOfStream) => 1,
            Err(e) => return Err(e.into()),
        };
        Ok(Zpop { key, max, count })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let zset = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => z,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Array(Vec::new()),
        };

        let count = self.count.max(0) as usize;
        let len = zset.len();
        let mut picked = if count == 0 {
            Vec::new()
        } else if self.max {
            let start = len.saturating_sub(count);
            zset.range_by_rank(start as i64, len as i64 - 1)
        } else {
            zset.range_by_rank(0, count as i64 - 1)
        };
        if self.max {
            picked.reverse();
        }

        for (member, _) in &picked {
            zset.remove(member);
        }
        g.remove_if_empty(db, self.key.as_bytes());

        let out = picked
            .into_iter()
            .flat_map(|(m, s)| [Frame::Bulk(m), Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(s)))])
            .collect();
        Frame::Array(out)
    }
}
