use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `GETDEL key`: return the string value and delete the key atomically.
#[derive(Debug)]
pub struct Getdel {
    key: String,
}

impl Getdel {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Getdel> {
        Ok(Getdel {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        match g.get(db, self.key.as_bytes()) {
            Some(Value::String(s)) => {
                let reply = Frame::Bulk(s.clone());
                g.delete(db, self.key.as_bytes());
                reply
            }
            Some(_) => resp_wrong_type(),
            None => Frame::Null,
        }
    }
}
