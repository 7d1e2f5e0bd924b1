use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_ok, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;
use std::collections::HashMap;

/// Shared implementation of HSET/HMSET (field/value pairs) and HSETNX (a
/// single field, only if absent).
#[derive(Debug)]
pub struct Hset {
    key: String,
    pairs: Vec<(Bytes, Bytes)>,
    reply_ok: bool,
    not_exists_only: bool,
}

impl Hset {
    pub(crate) fn parse_frames(parse: &mut Parse, reply_ok: bool) -> crate::Result<Hset> {
        let key = parse.next_string()?;
        let mut pairs = Vec::new();
        loop {
            let field = parse.next_bytes()?;
            let value = parse.next_bytes()?;
            pairs.push((field, value));
            if !parse.has_next() {
                break;
            }
        }
        Ok(Hset {
            key,
            pairs,
            reply_ok,
            not_exists_only: false,
        })
    }

    pub(crate) fn parse_frames_nx(parse: &mut Parse) -> crate::Result<Hset> {
        let key = parse.next_string()?;
        let field = parse.next_bytes()?;
        let value = parse.next_bytes()?;
        Ok(Hset {
            key,
            pairs: vec![(field, value)],
            reply_ok: false,
            not_exists_only: true,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::Hash(HashMap::new()));
        let hash = match value {
            Value::Hash(h) => h,
            _ => return resp_wrong_type(),
        };

        if self.not_exists_only {
            let (field, val) = &self.pairs[0];
            if hash.contains_key(field.as_ref()) {
                return Frame::Integer(0);
            }
            hash.insert(field.clone(), val.clone());
            return Frame::Integer(1);
        }

        let mut created = 0i64;
        for (field, val) in &self.pairs {
            if hash.insert(field.clone(), val.clone()).is_none() {
                created += 1;
            }
        }

        if self.reply_ok {
            resp_ok()
        } else {
            Frame::Integer(created)
        }
    }
}
