use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `ZCARD key`.
#[derive(Debug)]
pub struct Zcard {
    key: String,
}

impl Zcard {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zcard> {
        Ok(Zcard {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => Frame::Integer(z.len() as i64),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
