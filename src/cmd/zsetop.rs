use crate::cmd::Context;
use crate::db::Value;
use crate::parse::{Parse, ParseError};
use crate::utils::resp_wrong_type;
use crate::zset::SortedSet;
use crate::Frame;

use bytes::Bytes;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Union,
    Inter,
    Diff,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Aggregate {
    Sum,
    Min,
    Max,
}

impl Aggregate {
    fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            Aggregate::Sum => a + b,
            Aggregate::Min => a.min(b),
            Aggregate::Max => a.max(b),
        }
    }
}

/// Shared implementation of ZUNIONSTORE/ZINTERSTORE/ZDIFFSTORE and their
/// non-storing ZUNION/ZINTER/ZDIFF counterparts. DIFF has no WEIGHTS or
/// AGGREGATE (Redis doesn't accept them there either) but is folded into the
/// same struct since the source-combination logic is otherwise identical.
#[derive(Debug)]
pub struct Zsetop {
    op: Op,
    destination: Option<String>,
    keys: Vec<String>,
    weights: Vec<f64>,
    aggregate: Aggregate,
    withscores: bool,
}

impl Zsetop {
    pub(crate) fn parse_store(parse: &mut Parse, op: &str) -> crate::Result<Zsetop> {
        let destination = parse.next_string()?;
        let mut z = Self::parse_common(parse, parse_op(op))?;
        z.destination = Some(destination);
        Ok(z)
    }

    pub(crate) fn parse_read(parse: &mut Parse, op: &str) -> crate::Result<Zsetop> {
        Self::parse_common(parse, parse_op(op))
    }

    fn parse_common(parse: &mut Parse, op: Op) -> crate::Result<Zsetop> {
        let numkeys = parse.next_int()? as usize;
        if numkeys == 0 {
            return Err("ERR at least 1 input key is needed".into());
        }
        let mut keys = Vec::with_capacity(numkeys);
        for _ in 0..numkeys {
            keys.push(parse.next_string()?);
        }

        let mut weights = vec![1.0; numkeys];
        let mut aggregate = Aggregate::Sum;
        let mut withscores = false;

        loop {
            match parse.next_string() {
                Ok(opt) => match opt.to_uppercase().as_str() {
                    "WEIGHTS" => {
                        if op == Op::Diff {
                            return Err("ERR syntax error".into());
                        }
                        for w in weights.iter_mut() {
                            *w = parse.next_float()?;
                        }
                    }
                    "AGGREGATE" => {
                        if op == Op::Diff {
                            return Err("ERR syntax error".into());
                        }
                        let which = parse.next_string()?;
                        aggregate = match which.to_uppercase().as_str() {
                            "SUM" => Aggregate::Sum,
                            "MIN" => Aggregate::Min,
                            "MAX" => Aggregate::Max,
                            _ => return Err("ERR syntax error".into()),
                        };
                    }
                    "WITHSCORES" => withscores = true,
                    _ => return Err("ERR syntax error".into()),
                },
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Zsetop {
            op,
            destination: None,
            keys,
            weights,
            aggregate,
            withscores,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let mut sources: Vec<HashMap<Bytes, f64>> = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            match g.get(db, key.as_bytes()) {
                Some(Value::ZSet(z)) => {
                    sources.push(z.iter().map(|(m, s)| (m.clone(), s)).collect());
                }
                Some(Value::Set(s)) => {
                    sources.push(s.iter().map(|m| (m.clone(), 1.0)).collect());
                }
                Some(_) => return resp_wrong_type(),
                None => sources.push(HashMap::new()),
            }
        }

        let combined = match self.op {
            Op::Union => self.union(&sources),
            Op::Inter => self.inter(&sources),
            Op::Diff => self.diff(&sources),
        };

        if let Some(dest) = &self.destination {
            let mut out = SortedSet::new();
            for (member, score) in &combined {
                out.insert(member.clone(), *score);
            }
            let len = out.len() as i64;
            if out.is_empty() {
                g.delete(db, dest.as_bytes());
            } else {
                g.put(db, Bytes::copy_from_slice(dest.as_bytes()), Value::ZSet(out));
            }
            return Frame::Integer(len);
        }

        let mut sorted = combined;
        sorted.sort_by(|(m1, s1), (m2, s2)| {
            s1.partial_cmp(s2).unwrap_or(std::cmp::Ordering::Equal).then_with(|| m1.cmp(m2))
        });

        if self.withscores {
            Frame::Array(
                sorted
                    .into_iter()
                    .flat_map(|(m, s)| {
                        [
                            Frame::Bulk(m),
                            Frame::Bulk(Bytes::from(super::incrbyfloat::format_float(s))),
                        ]
                    })
                    .collect(),
            )
        } else {
            Frame::Array(sorted.into_iter().map(|(m, _)| Frame::Bulk(m)).collect())
        }
    }

    fn union(&self, sources: &[HashMap<Bytes, f64>]) -> Vec<(Bytes, f64)> {
        let mut acc: HashMap<Bytes, f64> = HashMap::new();
        for (i, source) in sources.iter().enumerate() {
            let weight = self.weights[i];
            for (member, score) in source {
                let weighted = score * weight;
                acc.entry(member.clone())
                    .and_modify(|existing| *existing = self.aggregate.combine(*existing, weighted))
                    .or_insert(weighted);
            }
        }
        acc.into_iter().collect()
    }

    fn inter(&self, sources: &[HashMap<Bytes, f64>]) -> Vec<(Bytes, f64)> {
        let Some(first) = sources.first() else {
            return Vec::new();
        };
        let mut acc: HashMap<Bytes, f64> = HashMap::new();
        'member: for (member, score) in first {
            let mut total = score * self.weights[0];
            for (i, source) in sources.iter().enumerate().skip(1) {
                match source.get(member) {
                    Some(s) => total = self.aggregate.combine(total, s * self.weights[i]),
                    None => continue 'member,
                }
            }
            acc.insert(member.clone(), total);
        }
        acc.into_iter().collect()
    }

    fn diff(&self, sources: &[HashMap<Bytes, f64>]) -> Vec<(Bytes, f64)> {
        let Some(first) = sources.first() else {
            return Vec::new();
        };
        first
            .iter()
            .filter(|(member, _)| !sources[1..].iter().any(|s| s.contains_key(*member)))
            .map(|(m, s)| (m.clone(), *s))
            .collect()
    }
}

fn parse_op(name: &str) -> Op {
    match name {
        "union" => Op::Union,
        "inter" => Op::Inter,
        "diff" => Op::Diff,
        _ => unreachable!("parse_op called with unknown operator name"),
    }
}
