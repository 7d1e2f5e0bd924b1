use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{glob_match, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;

/// `SSCAN key cursor [MATCH pattern] [COUNT count]`.
#[derive(Debug)]
pub struct Sscan {
    key: String,
    cursor: u64,
    pattern: Option<String>,
    count: usize,
}

impl Sscan {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Sscan> {
        let key = parse.next_string()?;
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
        Ok(Sscan {
            key,
            cursor,
            pattern,
            count: count.max(1),
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let db = ctx.session.db_index;
        let key = self.key.clone();
        let (next_cursor, batch) = {
            let mut g = ctx.lock();
            match g.get(db, key.as_bytes()) {
                Some(Value::Set(_)) | None => {}
                Some(_) => return resp_wrong_type(),
            }
            ctx.db.scan(self.cursor, self.count, || match g.get(db, key.as_bytes()) {
                Some(Value::Set(s)) => s.iter().cloned().collect(),
                _ => Vec::new(),
            })
        };

        let items = batch
            .into_iter()
            .filter(|m| match &self.pattern {
                Some(p) => glob_match(p.as_bytes(), m),
                None => true,
            })
            .map(Frame::Bulk)
            .collect();

        Frame::Array(vec![
            Frame::Bulk(Bytes::from(next_cursor.to_string())),
            Frame::Array(items),
        ])
    }
}
