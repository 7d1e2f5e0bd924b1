use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `ZSCORE key member`.
#[derive(Debug)]
pub struct Zscore {
    key: String,
    member: Bytes,
}

impl Zscore {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zscore> {
        let key = parse.next_string()?;
        let member = parse.next_bytes()?;
        Ok(Zscore { key, member })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => match z.score(&self.member) {
                Some(s) => Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(s))),
                None => Frame::Null,
            },
            Some(_) => resp_wrong_type(),
            None => Frame::Null,
        }
    }
}
