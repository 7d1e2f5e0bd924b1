use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

use bytes::Bytes;

#[derive(Debug, Clone, Copy)]
enum Where {
    Before,
    After,
}

/// `LINSERT key BEFORE|AFTER pivot value`.
#[derive(Debug)]
pub struct Linsert {
    key: String,
    position: Where,
    pivot: Bytes,
    value: Bytes,
}

impl Linsert {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Linsert> {
        let key = parse.next_string()?;
        let position = match parse.next_string()?.to_uppercase().as_str() {
            "BEFORE" => Where::Before,
            "AFTER" => Where::After,
            _ => return Err("ERR syntax error".into()),
        };
        let pivot = parse.next_bytes()?;
        let value = parse.next_bytes()?;
        Ok(Linsert {
            key,
            position,
            pivot,
            value,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let list = match g.get_mut(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::List(l)) => l,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Integer(0),
        };

        let pos = list.iter().position(|v| *v == self.pivot);
        match pos {
            Some(idx) => {
                let insert_at = match self.position {
                    Where::Before => idx,
                    Where::After => idx + 1,
                };
                list.insert(insert_at, self.value.clone());
                Frame::Integer(list.len() as i64)
            }
            None => Frame::Integer(-1),
        }
    }
}
