use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::{resp_not_float, resp_wrong_type};
use crate::zset::SortedSet;
use crate::Frame;

use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Existence {
    Any,
    MustNotExist,
    MustExist,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    None,
    Gt,
    Lt,
}

/// `ZADD key [NX|XX] [GT|LT] [CH] [INCR] score member [score member ...]`.
#[derive(Debug)]
pub struct Zadd {
    key: String,
    existence: Existence,
    comparison: Comparison,
    changed_reply: bool,
    incr: bool,
    pairs: Vec<(f64, Bytes)>,
}

impl Zadd {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zadd> {
        let key = parse.next_string()?;

        let mut existence = Existence::Any;
        let mut comparison = Comparison::None;
        let mut changed_reply = false;
        let mut incr = false;

        loop {
            match parse.peek_string_upper() {
                Some(s) => match s.as_str() {
                    "NX" => {
                        existence = Existence::MustNotExist;
                        parse.next_string()?;
                    }
                    "XX" => {
                        existence = Existence::MustExist;
                        parse.next_string()?;
                    }
                    "GT" => {
                        comparison = Comparison::Gt;
                        parse.next_string()?;
                    }
                    "LT" => {
                        comparison = Comparison::Lt;
                        parse.next_string()?;
                    }
                    "CH" => {
                        changed_reply = true;
                        parse.next_string()?;
                    }
                    "INCR" => {
                        incr = true;
                        parse.next_string()?;
                    }
                    _ => break,
                },
                None => break,
            }
        }

        if existence == Existence::MustNotExist && comparison != Comparison::None {
            return Err("ERR GT, LT, and/or NX options at the same time are not compatible".into());
        }

        let mut pairs = Vec::new();
        loop {
            let score = parse.next_float()?;
            let member = parse.next_bytes()?;
            pairs.push((score, member));
            if !parse.has_next() {
                break;
            }
        }

        if incr && pairs.len() != 1 {
            return Err("ERR INCR option supports a single increment-element pair".into());
        }

        Ok(Zadd {
            key,
            existence,
            comparison,
            changed_reply,
            incr,
            pairs,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::ZSet(SortedSet::new()));
        let zset = match value {
            Value::ZSet(z) => z,
            _ => return resp_wrong_type(),
        };

        let mut added = 0i64;
        let mut changed = 0i64;
        let mut incr_result: Option<f64> = None;

        for (score, member) in &self.pairs {
            let existing = zset.score(member);

            match self.existence {
                Existence::MustNotExist if existing.is_some() => continue,
                Existence::MustExist if existing.is_none() => continue,
                _ => {}
            }

            let new_score = if self.incr {
                existing.unwrap_or(0.0) + score
            } else {
                *score
            };

            if !new_score.is_finite() {
                return resp_not_float();
            }

            match (self.comparison, existing) {
                (Comparison::Gt, Some(old)) if new_score <= old => {
                    if self.incr {
                        incr_result = None;
                    }
                    continue;
                }
                (Comparison::Lt, Some(old)) if new_score >= old => {
                    if self.incr {
                        incr_result = None;
                    }
                    continue;
                }
                _ => {}
            }

            let prior = zset.insert(member.clone(), new_score);
            if prior.is_none() {
                added += 1;
                changed += 1;
            } else if prior != Some(new_score) {
                changed += 1;
            }
            if self.incr {
                incr_result = Some(new_score);
            }
        }

        g.remove_if_empty(db, self.key.as_bytes());

        if self.incr {
            return match incr_result {
                Some(v) => Frame::Bulk(Bytes::from(crate::cmd::incrbyfloat::format_float(v))),
                None => Frame::Null,
            };
        }

        if self.changed_reply {
            Frame::Integer(changed)
        } else {
            Frame::Integer(added)
        }
    }
}
