use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{parse_score_bound, resp_wrong_type};
use crate::Frame;

/// `ZCOUNT key min max`.
#[derive(Debug)]
pub struct Zcount {
    key: String,
    min: f64,
    min_exclusive: bool,
    max: f64,
    max_exclusive: bool,
}

impl Zcount {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zcount> {
        let key = parse.next_string()?;
        let min_tok = parse.next_string()?;
        let max_tok = parse.next_string()?;
        let (min, min_exclusive) = parse_score_bound(&min_tok).ok_or("ERR min or max is not a float")?;
        let (max, max_exclusive) = parse_score_bound(&max_tok).ok_or("ERR min or max is not a float")?;
        Ok(Zcount {
            key,
            min,
            min_exclusive,
            max,
            max_exclusive,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => Frame::Integer(
                z.count_by_score(self.min, self.min_exclusive, self.max, self.max_exclusive) as i64,
            ),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
