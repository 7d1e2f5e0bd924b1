use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{glob_match, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;

/// `ZSCAN key cursor [MATCH pattern] [COUNT count]`.
#[derive(Debug)]
pub struct Zscan {
    key: String,
    cursor: u64,
    pattern: Option<String>,
    count: usize,
}

impl Zscan {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zscan> {
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
        Ok(Zscan {
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
                Some(Value::ZSet(_)) | None => {}
                Some(_) => return resp_wrong_type(),
            }
            ctx.db.scan(self.cursor, self.count * 2, || match g.get(db, key.as_bytes()) {
                Some(Value::ZSet(z)) => z
                    .iter()
                    .flat_map(|(m, s)| {
                        [
                            m.clone(),
                            Bytes::from(super::incrbyfloat::format_float(s)),
                        ]
                    })
                    .collect(),
                _ => Vec::new(),
            })
        };

        let items: Vec<Frame> = batch
            .chunks_exact(2)
            .filter(|pair| match &self.pattern {
                Some(p) => glob_match(p.as_bytes(), &pair[0]),
                None => true,
            })
            .flat_map(|pair| [Frame::Bulk(pair[0].clone()), Frame::Bulk(pair[1].clone())])
            .collect();

        Frame::Array(vec![
            Frame::Bulk(Bytes::from(next_cursor.to_string())),
            Frame::Array(items),
        ])
    }
}
