use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{parse_score_bound, resp_wrong_type};
use crate::zset::{LexBound, SortedSet};
use crate::Frame;

use bytes::Bytes;

#[derive(Debug)]
enum By {
    Rank(i64, i64),
    Score(f64, bool, f64, bool),
    Lex(LexBound, LexBound),
}

/// Shared implementation of ZRANGE (and its BYSCORE/BYLEX/REV generalized
/// form), the legacy ZREVRANGE/ZRANGEBYSCORE/ZREVRANGEBYSCORE/ZRANGEBYLEX/
/// ZREVRANGEBYLEX commands, and ZRANGESTORE. Every variant is normalized to
/// "pick a `By` selector, optionally reverse, optionally slice with a
/// LIMIT, optionally store the result instead of returning it."
#[derive(Debug)]
pub struct Zrange {
    key: String,
    by: By,
    rev: bool,
    limit: Option<(i64, i64)>,
    withscores: bool,
    store: Option<String>,
}

impl Zrange {
    /// `ZRANGE key start stop [BYSCORE|BYLEX] [REV] [LIMIT offset count] [WITHSCORES]`
    pub(crate) fn parse_generic(parse: &mut Parse, store: Option<String>) -> crate::Result<Zrange> {
        let key = parse.next_string()?;
        let first = parse.next_string()?;
        let second = parse.next_string()?;

        let mut by_kind = "rank".to_string();
        let mut rev = false;
        let mut limit = None;
        let mut withscores = false;

        loop {
            match parse.next_string() {
                Ok(opt) => match opt.to_uppercase().as_str() {
                    "BYSCORE" => by_kind = "score".to_string(),
                    "BYLEX" => by_kind = "lex".to_string(),
                    "REV" => rev = true,
                    "WITHSCORES" => withscores = true,
                    "LIMIT" => {
                        let offset = parse.next_int_signed()?;
                        let count = parse.next_int_signed()?;
                        limit = Some((offset, count));
                    }
                    _ => return Err("ERR syntax error".into()),
                },
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if limit.is_some() && by_kind == "rank" {
            return Err("ERR syntax error, LIMIT is only supported in combination with either BYSCORE or BYLEX".into());
        }
        if withscores && by_kind == "lex" {
            return Err("ERR syntax error, WITHSCORES not supported in combination with BYLEX".into());
        }

        let by = match by_kind.as_str() {
            "score" => {
                let (min, max) = if rev { (second.as_str(), first.as_str()) } else { (first.as_str(), second.as_str()) };
                let (min, min_ex) = parse_score_bound(min).ok_or("ERR min or max is not a float")?;
                let (max, max_ex) = parse_score_bound(max).ok_or("ERR min or max is not a float")?;
                By::Score(min, min_ex, max, max_ex)
            }
            "lex" => {
                let (min_tok, max_tok) = if rev { (second.as_str(), first.as_str()) } else { (first.as_str(), second.as_str()) };
                let min = LexBound::parse(min_tok.as_bytes()).ok_or("ERR min or max not valid string range item")?;
                let max = LexBound::parse(max_tok.as_bytes()).ok_or("ERR min or max not valid string range item")?;
                By::Lex(min, max)
            }
            _ => {
                let start = first.parse::<i64>().map_err(|_| "ERR value is not an integer or out of range")?;
                let stop = second.parse::<i64>().map_err(|_| "ERR value is not an integer or out of range")?;
                By::Rank(start, stop)
            }
        };

        Ok(Zrange {
            key,
            by,
            rev,
            limit,
            withscores,
            store,
        })
    }

    /// Legacy `ZREVRANGE key start stop [WITHSCORES]`.
    pub(crate) fn parse_revrange(parse: &mut Parse) -> crate::Result<Zrange> {
        let key = parse.next_string()?;
        let start = parse.next_int_signed()?;
        let stop = parse.next_int_signed()?;
        let withscores = match parse.next_string() {
            Ok(s) if s.eq_ignore_ascii_case("withscores") => true,
            Ok(_) => return Err(resp_syntax_error_msg()),
            Err(ParseError::EndOfStream) => false,
            Err(e) => return Err(e.into()),
        };
        Ok(Zrange {
            key,
            by: By::Rank(start, stop),
            rev: true,
            limit: None,
            withscores,
            store: None,
        })
    }

    /// Legacy `Z[REV]RANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]`.
    pub(crate) fn parse_rangebyscore(parse: &mut Parse, rev: bool) -> crate::Result<Zrange> {
        let key = parse.next_string()?;
        let first = parse.next_string()?;
        let second = parse.next_string()?;
        let (min_tok, max_tok) = if rev { (second, first) } else { (first, second) };
        let (min, min_ex) = parse_score_bound(&min_tok).ok_or("ERR min or max is not a float")?;
        let (max, max_ex) = parse_score_bound(&max_tok).ok_or("ERR min or max is not a float")?;

        let mut withscores = false;
        let mut limit = None;
        loop {
            match parse.next_string() {
                Ok(opt) => match opt.to_uppercase().as_str() {
                    "WITHSCORES" => withscores = true,
                    "LIMIT" => {
                        let offset = parse.next_int_signed()?;
                        let count = parse.next_int_signed()?;
                        limit = Some((offset, count));
                    }
                    _ => return Err("ERR syntax error".into()),
                },
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Zrange {
            key,
            by: By::Score(min, min_ex, max, max_ex),
            rev,
            limit,
            withscores,
            store: None,
        })
    }

    /// Legacy `Z[REV]RANGEBYLEX key min max [LIMIT offset count]`.
    pub(crate) fn parse_rangebylex(parse: &mut Parse, rev: bool) -> crate::Result<Zrange> {
        let key = parse.next_string()?;
        let first = parse.next_string()?;
        let second = parse.next_string()?;
        let (min_tok, max_tok) = if rev { (second, first) } else { (first, second) };
        let min = LexBound::parse(min_tok.as_bytes()).ok_or("ERR min or max not valid string range item")?;
        let max = LexBound::parse(max_tok.as_bytes()).ok_or("ERR min or max not valid string range item")?;

        let mut limit = None;
        loop {
            match parse.next_string() {
                Ok(opt) if opt.eq_ignore_ascii_case("limit") => {
                    let offset = parse.next_int_signed()?;
                    let count = parse.next_int_signed()?;
                    limit = Some((offset, count));
                }
                Ok(_) => return Err("ERR syntax error".into()),
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Zrange {
            key,
            by: By::Lex(min, max),
            rev,
            limit,
            withscores: false,
            store: None,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let zset = match g.get(db, self.key.as_bytes()) {
            Some(Value::ZSet(z)) => z,
            Some(_) => return resp_wrong_type(),
            None => {
                return if let Some(dest) = &self.store {
                    g.delete(db, dest.as_bytes());
                    Frame::Integer(0)
                } else {
                    Frame::Array(Vec::new())
                };
            }
        };

        let mut items = match &self.by {
            By::Rank(start, stop) => {
                let mut all = zset.range_by_rank(0, -1);
                if self.rev {
                    all.reverse();
                }
                match crate::cmd::lrange::normalize_range(*start, *stop, all.len()) {
                    Some((s, e)) => all[s..=e].to_vec(),
                    None => Vec::new(),
                }
            }
            By::Score(min, min_ex, max, max_ex) => {
                let mut all = zset.range_by_score(*min, *min_ex, *max, *max_ex, 0, -1);
                if self.rev {
                    all.reverse();
                }
                apply_limit(all, self.limit)
            }
            By::Lex(min, max) => {
                let mut all = zset.range_by_lex(min, max, 0, -1);
                if self.rev {
                    all.reverse();
                }
                apply_limit(all, self.limit)
            }
        };

        if let Some(dest) = &self.store {
            let mut out = SortedSet::new();
            for (member, score) in items.drain(..) {
                out.insert(member, score);
            }
            let len = out.len() as i64;
            if out.is_empty() {
                g.delete(db, dest.as_bytes());
            } else {
                g.put(db, Bytes::copy_from_slice(dest.as_bytes()), Value::ZSet(out));
            }
            return Frame::Integer(len);
        }

        let frames = if self.withscores {
            items
                .into_iter()
                .flat_map(|(m, s)| [Frame::Bulk(m), Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(s)))])
                .collect()
        } else {
            items.into_iter().map(|(m, _)| Frame::Bulk(m)).collect()
        };
        Frame::Array(frames)
    }
}

fn apply_limit(all: Vec<(Bytes, f64)>, limit: Option<(i64, i64)>) -> Vec<(Bytes, f64)> {
    match limit {
        None => all,
        Some((offset, count)) => {
            let offset = offset.max(0) as usize;
            let rest: Vec<_> = all.into_iter().skip(offset).collect();
            if count < 0 {
                rest
            } else {
                rest.into_iter().take(count as usize).collect()
            }
        }
    }
}

fn resp_syntax_error_msg() -> crate::Error {
    "ERR syntax error".into()
}
