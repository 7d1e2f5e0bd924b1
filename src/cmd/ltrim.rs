use crate::cmd::lrange::normalize_range;
use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_ok, resp_wrong_type};
use crate::Frame;

/// `LTRIM key start stop`: keep only the inclusive range, discard the rest.
#[derive(Debug)]
pub struct Ltrim {
    key: String,
    start: i64,
    stop: i64,
}

impl Ltrim {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Ltrim> {
        let key = parse.next_string()?;
        let start = parse.next_int_signed()?;
        let stop = parse.next_int_signed()?;
        Ok(Ltrim { key, start, stop })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let list = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return resp_ok(),
        };
        match normalize_range(self.start, self.stop, list.len()) {
            Some((start, stop)) => {
                let kept: Vec<_> = list.iter().skip(start).take(stop - start + 1).cloned().collect();
                *list = kept.into();
            }
            None => list.clear(),
        }
        g.remove_if_empty(db, self.key.as_bytes());
        resp_ok()
    }
}
