use crate::cmd::Context;
use crate::parse::Parse;
use crate::utils::resp_ok;
use crate::Frame;

use bytes::Bytes;

/// Shared implementation of MSET and MSETNX: both parse a flat list of
/// alternating key/value pairs. MSETNX additionally requires that none of
/// the keys already exist, and sets none of them if that check fails.
#[derive(Debug)]
pub struct Mset {
    pairs: Vec<(String, Bytes)>,
    not_exists_only: bool,
}

impl Mset {
    pub(crate) fn parse_frames(parse: &mut Parse, not_exists_only: bool) -> crate::Result<Mset> {
        let mut pairs = Vec::new();
        loop {
            let key = parse.next_string()?;
            let value = parse.next_bytes()?;
            pairs.push((key, value));
            if !parse.has_next() {
                break;
            }
        }
        if pairs.is_empty() {
            return Err("ERR wrong number of arguments for MSET".into());
        }
        Ok(Mset { pairs, not_exists_only })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if self.not_exists_only {
            let any_exists = self.pairs.iter().any(|(k, _)| g.exists(db, k.as_bytes()));
            if any_exists {
                return Frame::Integer(0);
            }
        }

        for (key, value) in &self.pairs {
            g.put(
                db,
                Bytes::copy_from_slice(key.as_bytes()),
                crate::db::Value::String(value.clone()),
            );
        }

        if self.not_exists_only {
            Frame::Integer(1)
        } else {
            resp_ok()
        }
    }
}
