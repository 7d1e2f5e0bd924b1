use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `STRLEN key`: length of the string value, or 0 if the key is absent.
#[derive(Debug)]
pub struct Strlen {
    key: String,
}

impl Strlen {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Strlen> {
        Ok(Strlen {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::String(s)) => Frame::Integer(s.len() as i64),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
