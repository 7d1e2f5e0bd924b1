//! Publish/subscribe hub: channel and pattern subscription graphs with
//! fan-out. Deliberately independent of the keyspace mutex (spec.md §4.5/§5):
//! PUBLISH enqueues into each subscriber's outbound channel while holding
//! only the hub's own lock; the actual socket write happens later, in the
//! subscriber's own connection task.

use crate::frame::Frame;
use crate::utils::glob_match;

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub type ConnId = u64;

struct Subscribers {
    // channel/pattern -> (connection id -> outbound sender)
    by_key: HashMap<String, HashMap<ConnId, mpsc::UnboundedSender<Frame>>>,
}

impl Subscribers {
    fn new() -> Self {
        Subscribers {
            by_key: HashMap::new(),
        }
    }

    fn add(&mut self, key: &str, id: ConnId, tx: mpsc::UnboundedSender<Frame>) -> bool {
        let set = self.by_key.entry(key.to_string()).or_default();
        let is_new = !set.contains_key(&id);
        set.insert(id, tx);
        is_new
    }

    fn remove(&mut self, key: &str, id: ConnId) -> bool {
        let mut removed = false;
        if let Some(set) = self.by_key.get_mut(key) {
            removed = set.remove(&id).is_some();
            if set.is_empty() {
                self.by_key.remove(key);
            }
        }
        removed
    }

    fn remove_all_for(&mut self, id: ConnId) -> Vec<String> {
        let mut keys = Vec::new();
        self.by_key.retain(|key, set| {
            if set.remove(&id).is_some() {
                keys.push(key.clone());
            }
            !set.is_empty()
        });
        keys
    }
}

struct Inner {
    channels: Mutex<Subscribers>,
    patterns: Mutex<Subscribers>,
    next_id: AtomicU64,
}

/// Shared pub/sub state. Cheaply cloneable; clones share one hub.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<Inner>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Hub {
        Hub {
            inner: Arc::new(Inner {
                channels: Mutex::new(Subscribers::new()),
                patterns: Mutex::new(Subscribers::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn next_conn_id(&self) -> ConnId {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Subscribes `id` to `channel`; returns `true` if this was a new
    /// subscription for that connection.
    pub fn subscribe(&self, channel: &str, id: ConnId, tx: mpsc::UnboundedSender<Frame>) -> bool {
        self.inner.channels.lock().unwrap().add(channel, id, tx)
    }

    pub fn psubscribe(&self, pattern: &str, id: ConnId, tx: mpsc::UnboundedSender<Frame>) -> bool {
        self.inner.patterns.lock().unwrap().add(pattern, id, tx)
    }

    pub fn unsubscribe(&self, channel: &str, id: ConnId) -> bool {
        self.inner.channels.lock().unwrap().remove(channel, id)
    }

    pub fn punsubscribe(&self, pattern: &str, id: ConnId) -> bool {
        self.inner.patterns.lock().unwrap().remove(pattern, id)
    }

    /// Removes every subscription (channel and pattern) held by `id`,
    /// returning the channels and patterns that were dropped. Called when a
    /// connection closes.
    pub fn drop_connection(&self, id: ConnId) -> (Vec<String>, Vec<String>) {
        let channels = self.inner.channels.lock().unwrap().remove_all_for(id);
        let patterns = self.inner.patterns.lock().unwrap().remove_all_for(id);
        (channels, patterns)
    }

    /// Delivers `payload` published on `channel` to every exact-channel
    /// subscriber and every pattern subscriber whose pattern matches
    /// `channel`. Returns the number of subscribers reached. Delivery is a
    /// best-effort enqueue into the subscriber's outbound channel; if that
    /// subscriber has disconnected the message is silently dropped for it.
    pub fn publish(&self, channel: &str, payload: Bytes) -> u64 {
        let mut recipients = 0u64;

        if let Some(subs) = self.inner.channels.lock().unwrap().by_key.get(channel) {
            let frame = Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"message")),
                Frame::Bulk(Bytes::from(channel.to_string())),
                Frame::Bulk(payload.clone()),
            ]);
            for tx in subs.values() {
                if tx.send(frame.clone()).is_ok() {
                    recipients += 1;
                }
            }
        }

        let patterns = self.inner.patterns.lock().unwrap();
        for (pattern, subs) in patterns.by_key.iter() {
            if !glob_match(pattern.as_bytes(), channel.as_bytes()) {
                continue;
            }
            let frame = Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"pmessage")),
                Frame::Bulk(Bytes::from(pattern.clone())),
                Frame::Bulk(Bytes::from(channel.to_string())),
                Frame::Bulk(payload.clone()),
            ]);
            for tx in subs.values() {
                if tx.send(frame.clone()).is_ok() {
                    recipients += 1;
                }
            }
        }

        recipients
    }

    pub fn channels_matching(&self, pattern: Option<&str>) -> Vec<String> {
        let channels = self.inner.channels.lock().unwrap();
        channels
            .by_key
            .keys()
            .filter(|c| pattern.map(|p| glob_match(p.as_bytes(), c.as_bytes())).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn num_subscribers(&self, channel: &str) -> u64 {
        self.inner
            .channels
            .lock()
            .unwrap()
            .by_key
            .get(channel)
            .map(|s| s.len() as u64)
            .unwrap_or(0)
    }

    pub fn num_patterns(&self) -> u64 {
        self.inner.patterns.lock().unwrap().by_key.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_exact_and_pattern_subscribers() {
        let hub = Hub::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        hub.subscribe("news", 1, tx1);
        hub.psubscribe("ne*", 2, tx2);

        let n = hub.publish("news", Bytes::from_static(b"hello"));
        assert_eq!(n, 2);

        let msg1 = rx1.try_recv().unwrap();
        match msg1 {
            Frame::Array(parts) => assert_eq!(parts.len(), 3),
            _ => panic!("expected array"),
        }
        let msg2 = rx2.try_recv().unwrap();
        match msg2 {
            Frame::Array(parts) => assert_eq!(parts.len(), 4),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn drop_connection_removes_all_subscriptions() {
        let hub = Hub::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.subscribe("a", 1, tx.clone());
        hub.subscribe("b", 1, tx);
        let (channels, _patterns) = hub.drop_connection(1);
        assert_eq!(channels.len(), 2);
        assert_eq!(hub.publish("a", Bytes::from_static(b"x")), 0);
    }
}
