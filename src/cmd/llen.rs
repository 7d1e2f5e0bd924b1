use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `LLEN key`.
#[derive(Debug)]
pub struct Llen {
    key: String,
}

impl Llen {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Llen> {
        Ok(Llen {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::List(l)) => Frame::Integer(l.len() as i64),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
