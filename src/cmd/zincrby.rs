use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_not_float, resp_wrong_type};
use crate::zset::SortedSet;
use crate::Frame;

use bytes::Bytes;

/// `ZINCRBY key increment member`.
#[derive(Debug)]
pub struct Zincrby {
    key: String,
    delta: f64,
    member: Bytes,
}

impl Zincrby {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zincrby> {
        let key = parse.next_string()?;
        let delta = parse.next_float()?;
        let member = parse.next_bytes()?;
        Ok(Zincrby { key, delta, member })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::ZSet(SortedSet::new()));
        let zset = match value {
            Value::ZSet(z) => z,
            _ => return resp_wrong_type(),
        };

        let new_score = zset.score(&self.member).unwrap_or(0.0) + self.delta;
        if !new_score.is_finite() {
            return resp_not_float();
        }
        zset.insert(self.member.clone(), new_score);
        Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(new_score)))
    }
}
