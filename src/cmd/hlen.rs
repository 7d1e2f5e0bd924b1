use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `HLEN key`.
#[derive(Debug)]
pub struct Hlen {
    key: String,
}

impl Hlen {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hlen> {
        Ok(Hlen {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Hash(h)) => Frame::Integer(h.len() as i64),
            Some(_) => resp_wrong_type(),
            None => Frame::Integer(0),
        }
    }
}
