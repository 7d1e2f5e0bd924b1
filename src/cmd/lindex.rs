use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

/// `LINDEX key index`: negative indices count from the tail.
#[derive(Debug)]
pub struct Lindex {
    key: String,
    index: i64,
}

impl Lindex {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Lindex> {
        let key = parse.next_string()?;
        let index = parse.next_int_signed()?;
        Ok(Lindex { key, index })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let list = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Null,
        };
        let len = list.len() as i64;
        let idx = if self.index < 0 { len + self.index } else { self.index };
        if idx < 0 || idx >= len {
            return Frame::Null;
        }
        match list.get(idx as usize) {
            Some(v) => Frame::Bulk(v.clone()),
            None => Frame::Null,
        }
    }
}
