use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

/// `LPOS key element [RANK rank] [COUNT count] [MAXLEN len]`.
#[derive(Debug)]
pub struct Lpos {
    key: String,
    element: Bytes,
    rank: i64,
    count: Option<i64>,
    maxlen: i64,
}

impl Lpos {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Lpos> {
        let key = parse.next_string()?;
        let element = parse.next_bytes()?;
        let mut rank = 1i64;
        let mut count = None;
        let mut maxlen = 0i64;

        loop {
            match parse.next_string() {
                Ok(opt) => match opt.to_uppercase().as_str() {
                    "RANK" => {
                        rank = parse.next_int_signed()?;
                        if rank == 0 {
                            return Err("ERR RANK can't be zero".into());
                        }
                    }
                    "COUNT" => {
                        let c = parse.next_int_signed()?;
                        if c < 0 {
                            return Err("ERR COUNT can't be negative".into());
                        }
                        count = Some(c);
                    }
                    "MAXLEN" => {
                        let m = parse.next_int_signed()?;
                        if m < 0 {
                            return Err("ERR MAXLEN can't be negative".into());
                        }
                        maxlen = m;
                    }
                    _ => return Err("ERR syntax error".into()),
                },
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Lpos {
            key,
            element,
            rank,
            count,
            maxlen,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let list = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => {
                return if self.count.is_some() {
                    Frame::Array(Vec::new())
                } else {
                    Frame::Null
                }
            }
        };

        let len = list.len();
        let want = self.count.unwrap_or(1).max(0);
        let unbounded = self.count == Some(0);
        let scan_limit = if self.maxlen == 0 {
            len
        } else {
            (self.maxlen as usize).min(len)
        };

        let mut matches = Vec::new();
        if self.rank > 0 {
            let mut rank_left = self.rank;
            for (i, v) in list.iter().enumerate().take(scan_limit) {
                if *v == self.element {
                    if rank_left > 1 {
                        rank_left -= 1;
                        continue;
                    }
                    matches.push(i as i64);
                    if !unbounded && matches.len() as i64 >= want.max(1) {
                        break;
                    }
                }
            }
        } else {
            let mut rank_left = -self.rank;
            for (i, v) in list.iter().enumerate().rev().take(scan_limit) {
                if *v == self.element {
                    if rank_left > 1 {
                        rank_left -= 1;
                        continue;
                    }
                    matches.push(i as i64);
                    if !unbounded && matches.len() as i64 >= want.max(1) {
                        break;
                    }
                }
            }
        }

        match self.count {
            Some(_) => Frame::Array(matches.into_iter().map(Frame::Integer).collect()),
            None => match matches.into_iter().next() {
                Some(i) => Frame::Integer(i),
                None => Frame::Null,
            },
        }
    }
}
