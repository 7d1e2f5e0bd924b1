use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{resp_invalid_arguments, resp_wrong_type};
use crate::Frame;

use rand::Rng;

/// `SPOP key [count]`: removes and returns one or more random members.
#[derive(Debug)]
pub struct Spop {
    key: String,
    count: Option<i64>,
}

impl Spop {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Spop> {
        let key = parse.next_string()?;
        let count = match parse.next_int_signed() {
            Ok(n) => Some(n),
            Err(ParseError::EndOfStream) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Spop { key, count })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if let Some(count) = self.count {
            if count < 0 {
                return resp_invalid_arguments();
            }
            let set = match g.get_mut(db, self.key.as_bytes()) {
                Some(Value::Set(s)) => s,
                Some(_) => return resp_wrong_type(),
                None => return Frame::Array(Vec::new()),
            };
            let n = (count as usize).min(set.len());
            let mut rng = rand::thread_rng();
            let mut members: Vec<_> = set.iter().cloned().collect();
            let mut popped = Vec::with_capacity(n);
            for _ in 0..n {
                let idx = rng.gen_range(0..members.len());
                popped.push(members.swap_remove(idx));
            }
            for m in &popped {
                set.remove(m);
            }
            g.remove_if_empty(db, self.key.as_bytes());
            return Frame::Array(popped.into_iter().map(Frame::Bulk).collect());
        }

        let set = match g.get_mut(db, self.key.as_bytes()) {
            Some(Value::Set(s)) => s,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Null,
        };
        if set.is_empty() {
            return Frame::Null;
        }
        let idx = rand::thread_rng().gen_range(0..set.len());
        let member = set.iter().nth(idx).cloned().unwrap();
        set.remove(&member);
        g.remove_if_empty(db, self.key.as_bytes());
        Frame::Bulk(member)
    }
}
