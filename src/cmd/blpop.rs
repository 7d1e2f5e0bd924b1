use crate::cmd::lmove::Lmove;
use crate::cmd::pop::Pop;
use crate::cmd::Context;
use crate::parse::Parse;
use crate::Frame;

/// Shared implementation of BLPOP and BRPOP. Per spec.md's Non-goals, true
/// blocking is out of scope: these are immediate probes that behave exactly
/// like LPOP/RPOP across every key in turn, returning the first hit as a
/// two-element `[key, value]` array, or nil if every key is empty. The
/// trailing timeout argument is accepted and ignored.
#[derive(Debug)]
pub struct Blpop {
    keys: Vec<String>,
    left: bool,
}

impl Blpop {
    pub(crate) fn parse_frames(parse: &mut Parse, left: bool) -> crate::Result<Blpop> {
        let mut keys = vec![parse.next_string()?];
        // At least one more token (another key or the trailing timeout)
        // must follow; keep consuming until exactly one (the timeout) is
        // left unconsumed.
        loop {
            let tok = parse.next_string()?;
            if parse.has_next() {
                keys.push(tok);
            } else {
                // `tok` was the timeout; discard it.
                break;
            }
        }
        Ok(Blpop { keys, left })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        for key in &self.keys {
            let pop = Pop::probe(key.clone(), self.left);
            match pop.apply(ctx) {
                Frame::Bulk(v) => return Frame::Array(vec![Frame::Bulk(bytes::Bytes::copy_from_slice(key.as_bytes())), Frame::Bulk(v)]),
                Frame::Error(e) => return Frame::Error(e),
                _ => continue,
            }
        }
        Frame::Null
    }
}

/// `BRPOPLPUSH source destination timeout`: immediate probe equivalent to
/// RPOPLPUSH, nil if the source is empty.
#[derive(Debug)]
pub struct Brpoplpush {
    inner: Lmove,
}

impl Brpoplpush {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Brpoplpush> {
        let inner = Lmove::parse_frames_rpoplpush(parse)?;
        let _timeout = parse.next_string()?;
        Ok(Brpoplpush { inner })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        self.inner.apply(ctx)
    }
}

/// `BLMOVE source destination LEFT|RIGHT LEFT|RIGHT timeout`: immediate
/// probe equivalent to LMOVE, nil if the source is empty.
#[derive(Debug)]
pub struct Blmove {
    inner: Lmove,
}

impl Blmove {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Blmove> {
        let inner = Lmove::parse_frames_lmove(parse)?;
        let _timeout = parse.next_string()?;
        Ok(Blmove { inner })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        self.inner.apply(ctx)
    }
}
