use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::Frame;

use rand::seq::SliceRandom;
use rand::Rng;

/// `SRANDMEMBER key [count]`: like HRANDFIELD, a negative count allows
/// repeats and always returns exactly `|count|` entries.
#[derive(Debug)]
pub struct Srandmember {
    key: String,
    count: Option<i64>,
}

impl Srandmember {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Srandmember> {
        let key = parse.next_string()?;
        let count = match parse.next_int_signed() {
            Ok(n) => Some(n),
            Err(ParseError::EndOfStream) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Srandmember { key, count })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let set = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Set(s)) => s,
            Some(_) => return resp_wrong_type(),
            None => {
                return match self.count {
                    Some(_) => Frame::Array(Vec::new()),
                    None => Frame::Null,
                }
            }
        };

        let members: Vec<_> = set.iter().collect();
        if members.is_empty() {
            return match self.count {
                Some(_) => Frame::Array(Vec::new()),
                None => Frame::Null,
            };
        }

        let Some(count) = self.count else {
            let m = members[rand::thread_rng().gen_range(0..members.len())];
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
            (0..n).map(|_| members[rng.gen_range(0..members.len())]).collect()
        };

        Frame::Array(picked.into_iter().map(|m| Frame::Bulk(m.clone())).collect())
    }
}
