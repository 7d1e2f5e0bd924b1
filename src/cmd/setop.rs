use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
enum Op {
    Union,
    Inter,
    Diff,
}

/// Shared implementation of SUNION/SINTER/SDIFF and their *STORE variants.
#[derive(Debug)]
pub struct Setop {
    op: Op,
    destination: Option<String>,
    keys: Vec<String>,
}

impl Setop {
    pub(crate) fn parse_read(parse: &mut Parse, op_name: &str) -> crate::Result<Setop> {
        let op = parse_op(op_name);
        let mut keys = vec![parse.next_string()?];
        while parse.has_next() {
            keys.push(parse.next_string()?);
        }
        Ok(Setop {
            op,
            destination: None,
            keys,
        })
    }

    pub(crate) fn parse_store(parse: &mut Parse, op_name: &str) -> crate::Result<Setop> {
        let op = parse_op(op_name);
        let destination = parse.next_string()?;
        let mut keys = vec![parse.next_string()?];
        while parse.has_next() {
            keys.push(parse.next_string()?);
        }
        Ok(Setop {
            op,
            destination: Some(destination),
            keys,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let mut sets = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            match g.get(db, key.as_bytes()) {
                Some(Value::Set(s)) => sets.push(s.clone()),
                Some(_) => return resp_wrong_type(),
                None => sets.push(HashSet::new()),
            }
        }

        let result = match self.op {
            Op::Union => sets.into_iter().fold(HashSet::new(), |mut acc, s| {
                acc.extend(s);
                acc
            }),
            Op::Inter => {
                let mut iter = sets.into_iter();
                match iter.next() {
                    Some(first) => iter.fold(first, |acc, s| acc.intersection(&s).cloned().collect()),
                    None => HashSet::new(),
                }
            }
            Op::Diff => {
                let mut iter = sets.into_iter();
                match iter.next() {
                    Some(first) => iter.fold(first, |acc, s| acc.difference(&s).cloned().collect()),
                    None => HashSet::new(),
                }
            }
        };

        match &self.destination {
            Some(dest) => {
                let len = result.len() as i64;
                if result.is_empty() {
                    g.delete(db, dest.as_bytes());
                } else {
                    g.put(db, Bytes::copy_from_slice(dest.as_bytes()), Value::Set(result));
                }
                Frame::Integer(len)
            }
            None => Frame::Array(result.into_iter().map(Frame::Bulk).collect()),
        }
    }
}

fn parse_op(name: &str) -> Op {
    match name.to_uppercase().as_str() {
        "UNION" => Op::Union,
        "INTER" => Op::Inter,
        "DIFF" => Op::Diff,
        _ => Op::Union,
    }
}
