use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::zset::LexBound;
use crate::Frame;

/// `ZLEXCOUNT key min max`.
#[derive(Debug)]
pub struct Zlexcount {
    key: String,
    min: LexBound,
    max: LexBound,
}

impl Zlexcount {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zlexcount> {
        let key = parse.next_string()?;
        let min_tok = parse.next_bytes()?;
        let max_tok = parse.next_bytes()?;
        let min = LexBound::parse(&min_tok).ok_or("ERR min or max not valid string range item")?;
        let max = LexBound::parse(&max_tok).ok_or("ERR min or max not valid string range item")?;
        Ok(Zlexcount { key, min, max })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => {
                Frame::Integer(z.range_by_lex(&self.min, &self.max, 0, -1).len() as i64)
            }
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
