use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_not_float, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;
use std::collections::HashMap;

/// `HINCRBYFLOAT key field delta`.
#[derive(Debug)]
pub struct Hincrbyfloat {
    key: String,
    field: Bytes,
    delta: f64,
}

impl Hincrbyfloat {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hincrbyfloat> {
        let key = parse.next_string()?;
        let field = parse.next_bytes()?;
        let delta = parse.next_float()?;
        Ok(Hincrbyfloat { key, field, delta })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        let value = g.get_or_insert_with(db, self.key.as_bytes(), || Value::Hash(HashMap::new()));
        let hash = match value {
            Value::Hash(h) => h,
            _ => return resp_wrong_type(),
        };

        let current: f64 = match hash.get(self.field.as_ref()) {
            Some(v) => match std::str::from_utf8(v).ok().and_then(|s| s.trim().parse().ok()) {
                Some(v) => v,
                None => return resp_not_float(),
            },
            None => 0.0,
        };
        let updated = current + self.delta;
        if !updated.is_finite() {
            return Frame::Error("ERR increment would produce NaN or Infinity".into());
        }
        let formatted = super::incrbyfloat::format_float(updated);
        hash.insert(self.field.clone(), Bytes::from(formatted.clone()));
        Frame::Bulk(Bytes::from(formatted))
    }
}
