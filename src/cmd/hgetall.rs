use crate::cmd::Context;
use crate::db::Value;
use crate::parse::Parse;
use crate::utils::resp_wrong_type;
use crate::Frame;

#[derive(Debug, Clone, Copy)]
enum What {
    All,
    Keys,
    Values,
}

/// Shared implementation of HGETALL, HKEYS and HVALS.
#[derive(Debug)]
pub struct Hgetall {
    key: String,
    what: What,
}

impl Hgetall {
    pub(crate) fn parse_all(parse: &mut Parse) -> crate::Result<Hgetall> {
        Ok(Hgetall {
            key: parse.next_string()?,
            what: What::All,
        })
    }

    pub(crate) fn parse_keys(parse: &mut Parse) -> crate::Result<Hgetall> {
        Ok(Hgetall {
            key: parse.next_string()?,
            what: What::Keys,
        })
    }

    pub(crate) fn parse_values(parse: &mut Parse) -> crate::Result<Hgetall> {
        Ok(Hgetall {
            key: parse.next_string()?,
            what: What::Values,
        })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut g = ctx.lock();
        let hash = match g.get(ctx.session.db_index, self.key.as_bytes()) {
            Some(Value::Hash(h)) => h,
            Some(_) => return resp_wrong_type(),
            None => return Frame::Array(Vec::new()),
        };
        let out = match self.what {
            What::All => hash
                .iter()
                .flat_map(|(k, v)| [Frame::Bulk(k.clone()), Frame::Bulk(v.clone())])
                .collect(),
            What::Keys => hash.keys().map(|k| Frame::Bulk(k.clone())).collect(),
            What::Values => hash.values().map(|v| Frame::Bulk(v.clone())).collect(),
        };
        Frame::Array(out)
    }
}
