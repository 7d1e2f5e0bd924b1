use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `SMEMBERS key`.
#[derive(Debug)]
pub struct Smembers {
    key: String,
}

impl Smembers {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Smembers> {
        Ok(Smembers {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Set(s)) => Frame::Array(s.iter().map(|m| Frame::Bulk(m.clone())).collect()),
            Some(_) => resp_wrong_type(),
            None => Frame::Array(Vec::new()),
        }
    }
}
