use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `HDEL key field [field ...]`.
#[derive(Debug)]
pub struct Hdel {
    key: String,
    fields: Vec<Bytes>,
}

impl Hdel {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hdel> {
        let key = parse.next_string()?;
        let mut fields = vec![parse.next_bytes()?];
        while parse.has_next() {
            fields.push(parse.next_bytes()?);
        }
        Ok(Hdel { key, fields })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let hash = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::Hash(h)) => h,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        };
        let mut removed = 0i64;
        for field in &self.fields {
            if hash.remove(field.as_ref()).is_some() {
                removed += 1;
            }
        }
        g.remove_if_empty(db, self.key.as_bytes());
        Frame::Integer(removed)
    }
}
