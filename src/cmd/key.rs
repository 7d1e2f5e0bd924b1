use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_ok;
use crate::Frame;

use bytes::Bytes;

/// `DEL key [key ...]`.
#[derive(Debug)]
pub struct Del {
    keys: Vec<String>,
}

impl Del {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Del> {
        let mut keys = vec![parse.next_string()?];
        while parse.has_next() {
            keys.push(parse.next_string()?);
        }
        Ok(Del { keys })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let removed = self
            .keys
            .iter()
            .filter(|k| g.delete(db, k.as_bytes()))
            .count();
        Frame::Integer(removed as i64)
    }
}

/// `EXISTS key [key ...]`. Counts repeated keys more than once, matching
/// Redis's own contract.
#[derive(Debug)]
pub struct Exists {
    keys: Vec<String>,
}

impl Exists {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Exists> {
        let mut keys = vec![parse.next_string()?];
        while parse.has_next() {
            keys.push(parse.next_string()?);
        }
        Ok(Exists { keys })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let count = self
            .keys
            .iter()
            .filter(|k| g.exists(db, k.as_bytes()))
            .count();
        Frame::Integer(count as i64)
    }
}

/// `TYPE key`.
#[derive(Debug)]
pub struct TypeCmd {
    key: String,
}

impl TypeCmd {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<TypeCmd> {
        Ok(TypeCmd {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let name = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(v) => v.kind(),
            None => "none",
        };
        Frame::Simple(name.to_string())
    }
}

/// `RENAME key newkey` / `RENAMENX key newkey`.
#[derive(Debug)]
pub struct Rename {
    source: String,
    destination: String,
    not_exists_only: bool,
}

impl Rename {
    pub(crate) fn parse_frames(parse: &mut Parse, not_exists_only: bool) -> crate::Result<Rename> {
        let source = parse.next_string()?;
        let destination = parse.next_string()?;
        Ok(Rename {
            source,
            destination,
            not_exists_only,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if !g.exists(db, self.source.as_bytes()) {
            return Frame::Error("ERR no such key".to_string());
        }

        if self.not_exists_only {
            if g.exists(db, self.destination.as_bytes()) {
                return Frame::Integer(0);
            }
            g.rename(db, self.source.as_bytes(), Bytes::from(self.destination.clone().into_bytes()));
            return Frame::Integer(1);
        }

        g.rename(db, self.source.as_bytes(), Bytes::from(self.destination.clone().into_bytes()));
        resp_ok()
    }
}

/// `RANDOMKEY`.
#[derive(Debug)]
pub struct Randomkey;

impl Randomkey {
    pub(crate) fn parse_frames(_parse: &mut Parse) -> crate::Result<Randomkey> {
        Ok(Randomkey)
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        match g.random_key(ctx.session.db_index) {
            Some(k) => Frame::Bulk(k),
            None => Frame::Null,
        }
    }
}
