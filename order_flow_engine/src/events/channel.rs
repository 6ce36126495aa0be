//! In-process topic-routed fan-out.
//!
//! A [`TopicChannel`] is the engine-side stand-in for a broker topic exchange: subscribers bind with an exact routing
//! key or an AMQP-style wildcard pattern (`*` matches exactly one dot-separated word, `#` matches zero or more), and
//! every published event is delivered to every matching binding. The publisher has no knowledge of subscriber count
//! or identity.
//!
//! Subscriber queues are bounded. When a queue is full, publishing awaits until the subscriber catches up; a
//! subscriber that has gone away entirely is logged and skipped.

use log::*;
use tokio::sync::{mpsc, RwLock};

/// AMQP-style topic pattern match over dot-separated words.
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    fn matches(pattern: &[&str], key: &[&str]) -> bool {
        match (pattern.split_first(), key.split_first()) {
            (None, None) => true,
            (Some((&"#", rest)), _) => {
                // '#' absorbs zero or more words
                matches(rest, key) || (!key.is_empty() && matches(pattern, &key[1..]))
            },
            (Some((&"*", p_rest)), Some((_, k_rest))) => matches(p_rest, k_rest),
            (Some((p, p_rest)), Some((k, k_rest))) => p == k && matches(p_rest, k_rest),
            _ => false,
        }
    }
    let pattern = pattern.split('.').collect::<Vec<_>>();
    let key = key.split('.').collect::<Vec<_>>();
    matches(&pattern, &key)
}

struct Binding<E> {
    pattern: String,
    sender: mpsc::Sender<E>,
}

pub struct TopicChannel<E> {
    buffer_size: usize,
    bindings: RwLock<Vec<Binding<E>>>,
}

impl<E: Clone + Send + 'static> TopicChannel<E> {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size, bindings: RwLock::new(Vec::new()) }
    }

    /// Registers a new binding and returns its receiving end. Dropping the receiver detaches the binding; it is
    /// pruned on the next publish.
    pub async fn bind(&self, pattern: &str) -> mpsc::Receiver<E> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let mut bindings = self.bindings.write().await;
        bindings.push(Binding { pattern: pattern.to_string(), sender });
        debug!("📬️ New binding registered: {pattern}");
        receiver
    }

    /// Delivers `event` to every binding whose pattern matches `routing_key`, returning the number of deliveries.
    pub async fn publish(&self, routing_key: &str, event: E) -> usize {
        let mut delivered = 0;
        let mut stale = false;
        {
            let bindings = self.bindings.read().await;
            for binding in bindings.iter().filter(|b| pattern_matches(&b.pattern, routing_key)) {
                match binding.sender.send(event.clone()).await {
                    Ok(()) => delivered += 1,
                    Err(_) => {
                        debug!("📬️ Subscriber bound to {} has gone away", binding.pattern);
                        stale = true;
                    },
                }
            }
        }
        if stale {
            self.bindings.write().await.retain(|b| !b.sender.is_closed());
        }
        trace!("📬️ [{routing_key}] delivered to {delivered} subscribers");
        delivered
    }
}
