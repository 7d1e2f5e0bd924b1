use crate::cmd::zpop::Zpop;
use crate::cmd::Context;
use crate::parse::Parse;
use crate::Frame;

use bytes::Bytes;

/// Shared implementation of BZPOPMIN and BZPOPMAX. Per spec.md's Non-goals,
/// this is an immediate probe over each key in turn (no real blocking): the
/// first key with a member returns `[key, member, score]`, trailing
/// timeout is accepted and ignored.
#[derive(Debug)]
pub struct Bzpop {
    keys: Vec<String>,
    max: bool,
}

impl Bzpop {
    pub(crate) fn parse_frames(parse: &mut Parse, max: bool) -> crate::Result<Bzpop> {
        let mut keys = vec![parse.next_string()?];
        loop {
            let tok = parse.next_string()?;
            if parse.has_next() {
                keys.push(tok);
            } else {
                break;
            }
        }
        Ok(Bzpop { keys, max })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        for key in &self.keys {
            let probe = Zpop::single(key.clone(), self.max);
            match probe.apply(ctx) {
                Frame::Array(items) if !items.is_empty() => {
                    let mut out = vec![Frame::Bulk(Bytes::copy_from_slice(key.as_bytes()))];
                    out.extend(items);
                    return Frame::Array(out);
                }
                Frame::Error(e) => return Frame::Error(e),
                _ => continue,
            }
        }
        Frame::Null
    }
}
