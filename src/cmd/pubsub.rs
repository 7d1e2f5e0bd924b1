use crate::cmd::Context;
use crate::parse::Parse;
use crate::Frame;

use bytes::Bytes;

/// `SUBSCRIBE channel [channel ...]`.
#[derive(Debug)]
pub struct Subscribe {
    channels: Vec<String>,
}

impl Subscribe {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Subscribe> {
        let mut channels = vec![parse.next_string()?];
        while parse.has_next() {
            channels.push(parse.next_string()?);
        }
        Ok(Subscribe { channels })
    }

    /// SUBSCRIBE acknowledges once per channel. The caller writes whatever
    /// `apply` returns as the single direct reply, so every acknowledgement
    /// but the last is sent over the push channel (delivered by the
    /// connection's event loop alongside published messages) and the last
    /// one is simply returned.
    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut last = Frame::Simple("OK".to_string());
        for (i, channel) in self.channels.iter().enumerate() {
            ctx.hub.subscribe(channel, ctx.session.id, ctx.push_tx.clone());
            ctx.session.channels.insert(channel.clone());
            let count = ctx.session.subscription_count();
            let ack = Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"subscribe")),
                Frame::Bulk(Bytes::from(channel.clone())),
                Frame::Integer(count),
            ]);
            if i + 1 == self.channels.len() {
                last = ack;
            } else {
                let _ = ctx.push_tx.send(ack);
            }
        }
        last
    }
}

/// `UNSUBSCRIBE [channel ...]`. With no channels, unsubscribes from all.
#[derive(Debug)]
pub struct Unsubscribe {
    channels: Vec<String>,
}

impl Unsubscribe {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Unsubscribe> {
        let mut channels = Vec::new();
        while parse.has_next() {
            channels.push(parse.next_string()?);
        }
        Ok(Unsubscribe { channels })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let targets: Vec<String> = if self.channels.is_empty() {
            ctx.session.channels.iter().cloned().collect()
        } else {
            self.channels.clone()
        };

        if targets.is_empty() {
            return Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"unsubscribe")),
                Frame::Null,
                Frame::Integer(ctx.session.subscription_count()),
            ]);
        }

        let mut last = Frame::Simple("OK".to_string());
        for (i, channel) in targets.iter().enumerate() {
            ctx.hub.unsubscribe(channel, ctx.session.id);
            ctx.session.channels.remove(channel);
            let count = ctx.session.subscription_count();
            let ack = Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"unsubscribe")),
                Frame::Bulk(Bytes::from(channel.clone())),
                Frame::Integer(count),
            ]);
            if i + 1 == targets.len() {
                last = ack;
            } else {
                let _ = ctx.push_tx.send(ack);
            }
        }
        last
    }
}

/// `PSUBSCRIBE pattern [pattern ...]`.
#[derive(Debug)]
pub struct Psubscribe {
    patterns: Vec<String>,
}

impl Psubscribe {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Psubscribe> {
        let mut patterns = vec![parse.next_string()?];
        while parse.has_next() {
            patterns.push(parse.next_string()?);
        }
        Ok(Psubscribe { patterns })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let mut last = Frame::Simple("OK".to_string());
        for (i, pattern) in self.patterns.iter().enumerate() {
            ctx.hub.psubscribe(pattern, ctx.session.id, ctx.push_tx.clone());
            ctx.session.patterns.insert(pattern.clone());
            let count = ctx.session.subscription_count();
            let ack = Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"psubscribe")),
                Frame::Bulk(Bytes::from(pattern.clone())),
                Frame::Integer(count),
            ]);
            if i + 1 == self.patterns.len() {
                last = ack;
            } else {
                let _ = ctx.push_tx.send(ack);
            }
        }
        last
    }
}

/// `PUNSUBSCRIBE [pattern ...]`.
#[derive(Debug)]
pub struct Punsubscribe {
    patterns: Vec<String>,
}

impl Punsubscribe {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Punsubscribe> {
        let mut patterns = Vec::new();
        while parse.has_next() {
            patterns.push(parse.next_string()?);
        }
        Ok(Punsubscribe { patterns })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let targets: Vec<String> = if self.patterns.is_empty() {
            ctx.session.patterns.iter().cloned().collect()
        } else {
            self.patterns.clone()
        };

        if targets.is_empty() {
            return Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"punsubscribe")),
                Frame::Null,
                Frame::Integer(ctx.session.subscription_count()),
            ]);
        }

        let mut last = Frame::Simple("OK".to_string());
        for (i, pattern) in targets.iter().enumerate() {
            ctx.hub.punsubscribe(pattern, ctx.session.id);
            ctx.session.patterns.remove(pattern);
            let count = ctx.session.subscription_count();
            let ack = Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"punsubscribe")),
                Frame::Bulk(Bytes::from(pattern.clone())),
                Frame::Integer(count),
            ]);
            if i + 1 == targets.len() {
                last = ack;
            } else {
                let _ = ctx.push_tx.send(ack);
            }
        }
        last
    }
}

/// `PUBLISH channel message`.
#[derive(Debug)]
pub struct Publish {
    channel: String,
    message: Bytes,
}

impl Publish {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Publish> {
        let channel = parse.next_string()?;
        let message = parse.next_bytes()?;
        Ok(Publish { channel, message })
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        let count = ctx.hub.publish(&self.channel, self.message.clone());
        Frame::Integer(count as i64)
    }
}

/// `PUBSUB CHANNELS [pattern]` / `PUBSUB NUMSUB [channel ...]` / `PUBSUB NUMPAT`.
#[derive(Debug)]
pub enum Pubsub {
    Channels(Option<String>),
    Numsub(Vec<String>),
    Numpat,
}

impl Pubsub {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Pubsub> {
        let sub = parse.next_string()?;
        match sub.to_uppercase().as_str() {
            "CHANNELS" => {
                let pattern = parse.next_string().ok();
                Ok(Pubsub::Channels(pattern))
            }
            "NUMSUB" => {
                let mut channels = Vec::new();
                while parse.has_next() {
                    channels.push(parse.next_string()?);
                }
                Ok(Pubsub::Numsub(channels))
            }
            "NUMPAT" => Ok(Pubsub::Numpat),
            _ => Err("ERR syntax error".into()),
        }
    }

    pub(crate) fn apply(&self, ctx: &mut Context) -> Frame {
        match self {
            Pubsub::Channels(pattern) => {
                let channels = ctx.hub.channels_matching(pattern.as_deref());
                Frame::Array(
                    channels
                        .into_iter()
                        .map(|c| Frame::Bulk(Bytes::from(c)))
                        .collect(),
                )
            }
            Pubsub::Numsub(channels) => {
                let mut out = Vec::new();
                for channel in channels {
                    out.push(Frame::Bulk(Bytes::from(channel.clone())));
                    out.push(Frame::Integer(ctx.hub.num_subscribers(channel) as i64));
                }
                Frame::Array(out)
            }
            Pubsub::Numpat => Frame::Integer(ctx.hub.num_patterns() as i64),
        }
    }
}
