use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::Frame;

/// `MGET key [key ...]`: returns a value per key, nil for absent keys or
/// keys not holding a string (never errors on wrong type).
#[derive(Debug)]
pub struct Mget {
    keys: Vec<String>,
}

impl Mget {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Mget> {
        let mut keys = vec![parse.next_string()?];
        while parse.has_next() {
            keys.push(parse.next_string()?);
        }
        Ok(Mget { keys })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let values = self
            .keys
            .iter()
            .map(|key| match g.get(db, key.as_bytes()) {
                Some(Value::String(s)) => Frame::Bulk(s.clone()),
                _ => Frame::Null,
            })
            .collect();
        Frame::Array(values)
    }
}
