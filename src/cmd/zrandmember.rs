use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;
use rand::seq::SliceRandom;
use rand::Rng;

/// `ZRANDMEMBER key [count [WITHSCORES]]`: like SRANDMEMBER/HRANDFIELD, a
/// negative count allows repeats and always returns exactly `|count|`
/// entries.
#[derive(Debug)]
pub struct Zrandmember {
    key: String,
    count: Option<i64>,
    withscores: bool,
}

impl Zrandmember {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zrandmember> {
        let key = parse.next_string()?;
        let count = match parse.next_int_signed() {
            Ok(n) => Some(n),
            Err(ParseError::EndOfStream) => None,
            Err(e) => return Err(e.into()),
        };
        let withscores = match parse.next_string() {
            Ok(s) if s.eq_ignore_ascii_case("withscores") => true,
            Ok(_) => return Err("ERR syntax error".into()),
            Err(ParseError::EndOfStream) => false,
            Err(e) => return Err(e.into()),
        };
        if withscores && count.is_none() {
            return Err("ERR syntax error".into());
        }
        Ok(Zrandmember {
            key,
            count,
            withscores,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let zset = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => z,
            Some(_) => return resp_wrong_type(),
            None => {
                return match self.count {
                    Some(_) => Frame::Array(Vec::new()),
                    None => Frame::Null,
                }
            }
        };

        let members: Vec<_> = zset.iter().map(|(m, s)| (m.clone(), s)).collect();
        if members.is_empty() {
            return match self.count {
                Some(_) => Frame::Array(Vec::new()),
                None => Frame::Null,
            };
        }

        let Some(count) = self.count else {
            let (m, _) = &members[rand::thread_rng().gen_range(0..members.len())];
            return Frame::Bulk(m.clone());
        };

        let mut rng = rand::thread_rng();
        let picked: Vec<_> = if count >= 0 {
            let n = (count as usize).min(members.len());
            let mut shuffled = members.clone();
            shuffled.shuffle(&mut rng);
            shuffled.into_iter().take(n).collect()
        } else {
            let n = (-count) as usize;
            (0..n)
                .map(|_| members[rng.gen_range(0..members.len())].clone())
                .collect()
        };

        if self.withscores {
            Frame::Array(
                picked
                    .into_iter()
                    .flat_map(|(m, s)| {
                        [
                            Frame::Bulk(m),
                            Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(s))),
                        ]
                    })
                    .collect(),
            )
        } else {
            Frame::Array(picked.into_iter().map(|(m, _)| Frame::Bulk(m)).collect())
        }
    }
}
