use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `ZMSCORE key member [member ...]`.
#[derive(Debug)]
pub struct Zmscore {
    key: String,
    members: Vec<Bytes>,
}

impl Zmscore {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zmscore> {
        let key = parse.next_string()?;
        let mut members = vec![parse.next_bytes()?];
        while parse.has_next() {
            members.push(parse.next_bytes()?);
        }
        Ok(Zmscore { key, members })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let zset = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => Some(z),
            Some(_) => return resp_wrong_type(),
            None => None,
        };
        let out = self
            .members
            .iter()
            .map(|m| match zset.and_then(|z| z.score(m)) {
                Some(s) => Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(s))),
                None => Frame::Null,
            })
            .collect();
        Frame::Array(out)
    }
}
