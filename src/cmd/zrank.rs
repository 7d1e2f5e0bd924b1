use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// Shared implementation of ZRANK and ZREVRANK, both with the Redis 7
/// optional `WITHSCORE` modifier.
#[derive(Debug)]
pub struct Zrank {
    key: String,
    member: Bytes,
    rev: bool,
    withscore: bool,
}

impl Zrank {
    pub(crate) fn parse_frames(parse: &mut Parse, rev: bool) -> crate::Result<Zrank> {
        let key = parse.next_string()?;
        let member = parse.next_bytes()?;
        let withscore = match parse.next_string() {
            Ok(s) if s.eq_ignore_ascii_case("withscore") => true,
            Ok(_) => return Err("ERR syntax error".into()),
            Err(ParseError::EndOfStream) => false,
            Err(e) => return Err(e.into()),
        };
        Ok(Zrank {
            key,
            member,
            rev,
            withscore,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let zset = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => z,
            Some(_) => return resp_wrong_type(),
            None => return self.not_found(),
        };
        let rank = match zset.rank(&self.member) {
            Some(r) => r,
            None => return self.not_found(),
        };
        let rank = if self.rev {
            zset.len() as u64 - 1 - rank
        } else {
            rank
        };
        if self.withscore {
            let score = zset.score(&self.member).unwrap_or(0.0);
            Frame::Array(vec![
                Frame::Integer(rank as i64),
                Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(score))),
            ])
        } else {
            Frame::Integer(rank as i64)
        }
    }

    fn not_found(&self) -> Frame {
        if self.withscore {
            Frame::NullArray
        } else {
            Frame::Null
        }
    }
}
