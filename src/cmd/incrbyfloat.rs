use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::{resp_not_float, resp_wrong_type};
use crate::Frame;

use bytes::Bytes;

/// `INCRBYFLOAT key delta`: add a floating-point delta to the string value,
/// formatting the result without trailing zeroes (mirrors the teacher's
/// float formatting for ZINCRBY-family replies).
#[derive(Debug)]
pub struct IncrByFloat {
    key: String,
    delta: f64,
}

impl IncrByFloat {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<IncrByFloat> {
        let key = parse.next_string()?;
        let delta = parse.next_float()?;
        Ok(IncrByFloat { key, delta })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if let Some(value) = g.get_mut(db, self.key.as_bytes()) {
            let s = match value {
                Value::String(s) => s,
                _ => return resp_wrong_type(),
            };
            let current: f64 = match std::str::from_utf8(s).ok().and_then(|s| s.trim().parse().ok()) {
                Some(v) => v,
                None => return resp_not_float(),
            };
            let updated = current + self.delta;
            if !updated.is_finite() {
                return Frame::Error("ERR increment would produce NaN or Infinity".into());
            }
            let formatted = format_float(updated);
            *s = Bytes::from(formatted.clone());
            return Frame::Bulk(Bytes::from(formatted));
        }

        if !self.delta.is_finite() {
            return Frame::Error("ERR increment would produce NaN or Infinity".into());
        }
        let formatted = format_float(self.delta);
        g.put(
            db,
            Bytes::copy_from_slice(self.key.as_bytes()),
            Value::String(Bytes::from(formatted.clone())),
        );
        Frame::Bulk(Bytes::from(formatted))
    }
}

/// Formats like Redis: fixed-point with trailing zeroes (and a bare trailing
/// dot) trimmed off.
pub(super) fn format_float(v: f64) -> String {
    let mut s = format!("{v:.17}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}
