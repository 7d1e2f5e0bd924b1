use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::Frame;

use rand::seq::SliceRandom;
use rand::Rng;

/// `HRANDFIELD key [count [WITHVALUES]]`. A positive count returns up to
/// `count` distinct fields; a negative count allows repeats and always
/// returns exactly `|count|` entries.
#[derive(Debug)]
pub struct Hrandfield {
    key: String,
    count: Option<i64>,
    with_values: bool,
}

impl Hrandfield {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hrandfield> {
        let key = parse.next_string()?;
        let count = match parse.next_int_signed() {
            Ok(n) => Some(n),
            Err(ParseError::EndOfStream) => None,
            Err(e) => return Err(e.into()),
        };
        let with_values = match parse.next_string() {
            Ok(s) if s.eq_ignore_ascii_case("withvalues") => true,
            Ok(_) => return Err("ERR syntax error".into()),
            Err(ParseError::EndOfStream) => false,
            Err(e) => return Err(e.into()),
        };
        if with_values && count.is_none() {
            return Err("ERR syntax error".into());
        }
        Ok(Hrandfield {
            key,
            count,
            with_values,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let hash = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Hash(h)) => h,
            Some(_) => return resp_wrong_type(),
            None => {
                return match self.count {
                    Some(_) => Frame::Array(Vec::new()),
                    None => Frame::Null,
                }
            }
        };

        let entries: Vec<_> = hash.iter().collect();
        if entries.is_empty() {
            return match self.count {
                Some(_) => Frame::Array(Vec::new()),
                None => Frame::Null,
            };
        }

        let Some(count) = self.count else {
            let (field, _) = entries[rand::thread_rng().gen_range(0..entries.len())];
            return Frame::Bulk(field.clone());
        };

        let mut rng = rand::thread_rng();
        let picked: Vec<_> = if count >= 0 {
            let n = (count as usize).min(entries.len());
            let mut shuffled = entries.clone();
            shuffled.shuffle(&mut rng);
            shuffled.into_iter().take(n).collect()
        } else {
            let n = (-count) as usize;
            (0..n)
                .map(|_| entries[rng.gen_range(0..entries.len())])
                .collect()
        };

        let out = if self.with_values {
            picked
                .into_iter()
                .flat_map(|(f, v)| [Frame::Bulk(f.clone()), Frame::Bulk(v.clone())])
                .collect()
        } else {
            picked.into_iter().map(|(f, _)| Frame::Bulk(f.clone())).collect()
        };
        Frame::Array(out)
    }
}
