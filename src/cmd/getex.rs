use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{now_timestamp_in_millis, resp_wrong_type};
use crate::Frame;

#[derive(Debug)]
enum ExpireChange {
    None,
    Persist,
    At(i64),
}

/// `GETEX key [EX s | PX ms | EXAT ts | PXAT ts-ms | PERSIST]`: like GET,
/// but additionally able to set or clear the key's TTL in the same step.
#[derive(Debug)]
pub struct Getex {
    key: String,
    change: ExpireChange,
}

impl Getex {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Getex> {
        let key = parse.next_string()?;
        let now = now_timestamp_in_millis();
        let change = match parse.next_string() {
            Ok(s) => match s.to_uppercase().as_str() {
                "EX" => ExpireChange::At(now + parse.next_int()? as i64 * 1000),
                "PX" => ExpireChange::At(now + parse.next_int()? as i64),
                "EXAT" => ExpireChange::At(parse.next_int()? as i64 * 1000),
                "PXAT" => ExpireChange::At(parse.next_int()? as i64),
                "PERSIST" => ExpireChange::Persist,
                _ => return Err("syntax error".into()),
            },
            Err(ParseError::EndOfStream) => ExpireChange::None,
            Err(e) => return Err(e.into()),
        };
        Ok(Getex { key, change })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let reply = match g.get(db, self.key.as_bytes()) {
            Some(Value::String(s)) => Frame::Bulk(s.clone()),
            Some(_) => return resp_wrong_type(),
            None => return Frame::Null,
        };
        match self.change {
            ExpireChange::Persist => {
                g.clear_expiry(db, self.key.as_bytes());
            }
            ExpireChange::At(at) => {
                g.set_expiry(db, self.key.as_bytes(), at);
            }
            ExpireChange::None => {}
        }
        reply
    }
}
