use crate::cmd::Context;
use crate::parse::{Parse, ParseError};
use crate::utils::glob_match;
use crate::Frame;

use bytes::Bytes;

/// `KEYS pattern`. Unlike SCAN this is not cursor-based: it walks the whole
/// keyspace in one shot, which is exactly as blocking on a large keyspace as
/// real Redis's KEYS is.
#[derive(Debug)]
pub struct Keys {
    pattern: String,
}

impl Keys {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Keys> {
        Ok(Keys {
            pattern: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let pattern = self.pattern.as_bytes();
        let out = g
            .all_keys(ctx.session.db_index)
            .into_iter()
            .filter(|k| glob_match(pattern, k))
            .map(Frame::Bulk)
            .collect();
        Frame::Array(out)
    }
}

/// Keyspace-level `SCAN cursor [MATCH pattern] [COUNT count]`.
#[derive(Debug)]
pub struct Scan {
    cursor: u64,
    pattern: Option<String>,
    count: usize,
}

impl Scan {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Scan> {
        let cursor = parse.next_int()?;
        let mut pattern = None;
        let mut count = 10usize;

        loop {
            match parse.next_string() {
                Ok(opt) => match opt.to_uppercase().as_str() {
                    "MATCH" => pattern = Some(parse.next_string()?),
                    "COUNT" => count = parse.next_int()? as usize,
                    _ => return Err("ERR syntax error".into()),
                },
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Scan {
            cursor,
            pattern,
            count: count.max(1),
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let db_index = ctx.session.db_index;
        let (next, items) = {
            let mut g = ctx.lock();
            ctx.db.scan(self.cursor, self.count, || g.all_keys(db_index))
        };

        let pattern = self.pattern.as_deref();
        let keys = items
            .into_iter()
            .filter(|k| pattern.map(|p| glob_match(p.as_bytes(), k)).unwrap_or(true))
            .map(Frame::Bulk)
            .collect();

        Frame::Array(vec![
            Frame::Bulk(Bytes::from(next.to_string())),
            Frame::Array(keys),
        ])
    }
}
