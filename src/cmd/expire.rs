use crate::cmd::Context;
use crate::parse::{Parse, ParseError};
use crate::Frame;

/// Relative/absolute unit of an EXPIRE-family deadline, resolved to absolute
/// milliseconds by `parse_frames` so `apply` never has to branch on it.
#[derive(Debug)]
pub struct Expire {
    key: String,
    expire_at_ms: i64,
    condition: Condition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Condition {
    Always,
    Nx,
    Xx,
    Gt,
    Lt,
}

impl Expire {
    /// `unit_ms` is 1000 for EXPIRE/EXPIREAT (seconds), 1 for PEXPIRE/PEXPIREAT
    /// (milliseconds). `absolute` is true for EXPIREAT/PEXPIREAT.
    pub(crate) fn parse_frames(parse: &mut Parse, unit_ms: i64, absolute: bool) -> crate::Result<Expire> {
        let key = parse.next_string()?;
        let amount = parse.next_int_signed()?;

        let mut condition = Condition::Always;
        loop {
            match parse.next_string() {
                Ok(opt) => {
                    condition = match opt.to_uppercase().as_str() {
                        "NX" => Condition::Nx,
                        "XX" => Condition::Xx,
                        "GT" => Condition::Gt,
                        "LT" => Condition::Lt,
                        _ => return Err("ERR Unsupported option".into()),
                    };
                }
                Err(ParseError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        }

        let expire_at_ms = if absolute {
            amount * unit_ms
        } else {
            crate::utils::now_timestamp_in_millis() + amount * unit_ms
        };

        Ok(Expire {
            key,
            expire_at_ms,
            condition,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;

        if !g.exists(db, self.key.as_bytes()) {
            return Frame::Integer(0);
        }

        if self.expire_at_ms <= g.now_ms() {
            g.delete(db, self.key.as_bytes());
            return Frame::Integer(1);
        }

        let current = g.get_entry(db, self.key.as_bytes()).and_then(|e| e.expire_at);
        let allowed = match self.condition {
            Condition::Always => true,
            Condition::Nx => current.is_none(),
            Condition::Xx => current.is_some(),
            Condition::Gt => current.is_some_and(|at| self.expire_at_ms > at),
            Condition::Lt => match current {
                Some(at) => self.expire_at_ms < at,
                None => true,
            },
        };

        if !allowed {
            return Frame::Integer(0);
        }

        g.set_expiry(db, self.key.as_bytes(), self.expire_at_ms);
        Frame::Integer(1)
    }
}

/// `TTL key` / `PTTL key`.
#[derive(Debug)]
pub struct Ttl {
    key: String,
    millis: bool,
}

impl Ttl {
    pub(crate) fn parse_frames(parse: &mut Parse, millis: bool) -> crate::Result<Ttl> {
        Ok(Ttl {
            key: parse.next_string()?,
            millis,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let db = ctx.session.db_index;
        let entry = match g.get_entry(db, self.key.as_bytes()) {
            Some(e) => e,
            None => return Frame::Integer(-2),
        };
        match entry.expire_at {
            None => Frame::Integer(-1),
            Some(at) => {
                let remaining = (at - g.now_ms()).max(0);
                if self.millis {
                    Frame::Integer(remaining)
                } else {
                    Frame::Integer((remaining + 999) / 1000)
                }
            }
        }
    }
}

/// `PERSIST key`.
#[derive(Debug)]
pub struct Persist {
    key: String,
}

impl Persist {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Persist> {
        Ok(Persist {
            key: parse.next_string()?,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let cleared = g.clear_expiry(ctx.session.db_index, self.key.as_bytes());
        Frame::Integer(cleared as i64)
    }
}
