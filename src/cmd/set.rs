use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{resp_ok, resp_syntax_error, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Existence {
    Any,
    MustNotExist,
    MustExist,
}

/// `SET key value [NX | XX] [GET] [EX seconds | PX milliseconds | EXAT
/// unix-seconds | PXAT unix-ms | KEEPTTL]`
///
/// Any previous value (and, unless KEEPTTL is given, any previous TTL) is
/// discarded on a successful SET.
#[derive(Debug)]
pub struct Set {
    key: String,
    value: Bytes,
    existence: Existence,
    want_old: bool,
    expire_at_ms: Option<i64>,
    keep_ttl: bool,
}

impl Set {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Set> {
        let key = parse.next_string()?;
        let value = parse.next_bytes()?;

        let mut existence = Existence::Any;
        let mut want_old = false;
        let mut expire_at_ms = None;
        let mut keep_ttl = false;
        let now = crate::utils::now_timestamp_in_millis();

        loop {
            let opt = match parse.next_string() {
                Ok(s) => s.to_uppercase(),
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            };
            match opt.as_str() {
                "NX" => existence = Existence::MustNotExist,
                "XX" => existence = Existence::MustExist,
                "GET" => want_old = true,
                "KEEPTTL" => keep_ttl = true,
                "EX" => expire_at_ms = Some(now + parse.next_int()? as i64 * 1000),
                "PX" => expire_at_ms = Some(now + parse.next_int()? as i64),
                "EXAT" => expire_at_ms = Some(parse.next_int()? as i64 * 1000),
                "PXAT" => expire_at_ms = Some(parse.next_int()? as i64),
                _ => return Err("syntax error".into()),
            }
        }

        Ok(Set {
            key,
            value,
            existence,
            want_old,
            expire_at_ms,
            keep_ttl,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        if self.expire_at_ms.is_some() && self.keep_ttl {
            return resp_syntax_error();
        }

        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let key = self.key.as_bytes();

        let old_entry = g.get_entry(db, key).cloned();
        if let Some(entry) = &old_entry {
            if !matches!(entry.value, Value::String(_)) && self.want_old {
                return resp_wrong_type();
            }
        }

        let exists = old_entry.is_some();
        let condition_failed = match self.existence {
            Existence::MustNotExist => exists,
            Existence::MustExist => !exists,
            Existence::Any => false,
        };
        if condition_failed {
            return if self.want_old {
                old_value_frame(&old_entry)
            } else {
                Frame::Null
            };
        }

        let prior_expiry = old_entry.as_ref().and_then(|e| e.expire_at);
        g.put(db, Bytes::copy_from_slice(key), Value::String(self.value.clone()));
        if self.keep_ttl {
            if let Some(at) = prior_expiry {
                g.set_expiry(db, key, at);
            }
        } else if let Some(at) = self.expire_at_ms {
            g.set_expiry(db, key, at);
        }

        if self.want_old {
            old_value_frame(&old_entry)
        } else {
            resp_ok()
        }
    }
}

fn old_value_frame(entry: &Option<crate::db::Entry>) -> Frame {
    match entry {
        Some(e) => match &e.value {
            Value::String(s) => Frame::Bulk(s.clone()),
            _ => Frame::Null,
        },
        None => Frame::Null,
    }
}
