use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{parse_score_bound, resp_wrong_type};
use crate::zset::LexBound;
use crate::Frame;

#[derive(Debug)]
enum By {
    Rank(i64, i64),
    Score(f64, bool, f64, bool),
    Lex(LexBound, LexBound),
}

/// Shared implementation of ZREMRANGEBYRANK, ZREMRANGEBYSCORE, and
/// ZREMRANGEBYLEX: select a range with the same selectors ZRANGE uses, then
/// delete every member it selects.
#[derive(Debug)]
pub struct Zremrange {
    key: String,
    by: By,
}

impl Zremrange {
    pub(crate) fn parse_rank(parse: &mut Parse) -> crate::Result<Zremrange> {
        let key = parse.next_string()?;
        let start = parse.next_int_signed()?;
        let stop = parse.next_int_signed()?;
        Ok(Zremrange {
            key,
            by: By::Rank(start, stop),
        })
    }

    pub(crate) fn parse_score(parse: &mut Parse) -> crate::Result<Zremrange> {
        let key = parse.next_string()?;
        let min_tok = parse.next_string()?;
        let max_tok = parse.next_string()?;
        let (min, min_ex) = parse_score_bound(&min_tok).ok_or("ERR min or max is not a float")?;
        let (max, max_ex) = parse_score_bound(&max_tok).ok_or("ERR min or max is not a float")?;
        Ok(Zremrange {
            key,
            by: By::Score(min, min_ex, max, max_ex),
        })
    }

    pub(crate) fn parse_lex(parse: &mut Parse) -> crate::Result<Zremrange> {
        let key = parse.next_string()?;
        let min_tok = parse.next_bytes()?;
        let max_tok = parse.next_bytes()?;
        let min = LexBound::parse(&min_tok).ok_or("ERR min or max not valid string range item")?;
        let max = LexBound::parse(&max_tok).ok_or("ERR min or max not valid string range item")?;
        Ok(Zremrange {
            key,
            by: By::Lex(min, max),
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let zset = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => z,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        };

        let selected = match &self.by {
            By::Rank(start, stop) => zset.range_by_rank(*start, *stop),
            By::Score(min, min_ex, max, max_ex) => {
                zset.range_by_score(*min, *min_ex, *max, *max_ex, 0, -1)
            }
            By::Lex(min, max) => zset.range_by_lex(min, max, 0, -1),
        };

        for (member, _) in &selected {
            zset.remove(member);
        }
        g.remove_if_empty(db, self.key.as_bytes());
        Frame::Integer(selected.len() as i64)
    }
}
