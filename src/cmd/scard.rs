use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `SCARD key`.
#[derive(Debug)]
pub struct Scard {
    key: String,
}

impl Scard {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Scard> {
        Ok(Scard {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Set(s)) => Frame::Integer(s.len() as i64),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
