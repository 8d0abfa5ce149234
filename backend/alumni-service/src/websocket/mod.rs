use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;

pub use events::{publish, WsEvent, WsInboundEvent};

/// What a WebSocket session listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Group(i64),
    Chat(i64),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Group(id) => write!(f, "group:{}", id),
            Topic::Chat(id) => write!(f, "chat:{}", id),
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    /// Parses `group:{id}` or `chat:{id}`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid topic: {}", s))?;
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid topic id: {}", id))?;
        match kind.trim() {
            "group" => Ok(Topic::Group(id)),
            "chat" => Ok(Topic::Chat(id)),
            other => Err(format!("unknown topic kind: {}", other)),
        }
    }
}

/// Unique identifier for a WebSocket subscriber, used for precise cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<String>,
}

/// Tracks which sessions listen to which topic.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<Topic, Vec<Subscriber>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic. The receiver yields every payload broadcast to it.
    pub async fn add_subscriber(&self, topic: Topic) -> (SubscriberId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard.entry(topic).or_default().push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });

        tracing::debug!(
            topic = %topic,
            subscriber = ?subscriber_id,
            total = guard.get(&topic).map(|v| v.len()).unwrap_or(0),
            "added subscriber"
        );

        (subscriber_id, rx)
    }

    /// Must be called when a session closes.
    pub async fn remove_subscriber(&self, topic: Topic, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;

        if let Some(subscribers) = guard.get_mut(&topic) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(&topic);
                tracing::debug!(topic = %topic, "removed empty topic from registry");
            }
        }
    }

    /// Send `msg` to every subscriber of `topic`, dropping closed ones.
    pub async fn broadcast(&self, topic: Topic, msg: String) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&topic) {
            let before = subscribers.len();
            subscribers.retain(|subscriber| subscriber.sender.send(msg.clone()).is_ok());

            let after = subscribers.len();
            if before != after {
                tracing::debug!(
                    topic = %topic,
                    dropped = before - after,
                    active = after,
                    "cleaned up closed subscribers"
                );
            }
            if subscribers.is_empty() {
                guard.remove(&topic);
            }
        }
    }

    pub async fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .read()
            .await
            .get(&topic)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_parsing() {
        assert_eq!("group:7".parse::<Topic>(), Ok(Topic::Group(7)));
        assert_eq!("chat:42".parse::<Topic>(), Ok(Topic::Chat(42)));
        assert!("chat:abc".parse::<Topic>().is_err());
        assert!("room:1".parse::<Topic>().is_err());
        assert!("group".parse::<Topic>().is_err());
        assert_eq!(Topic::Chat(42).to_string(), "chat:42");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_topic_subscribers() {
        let registry = ConnectionRegistry::new();
        let (_, mut group_rx) = registry.add_subscriber(Topic::Group(1)).await;
        let (_, mut chat_rx) = registry.add_subscriber(Topic::Chat(1)).await;

        registry.broadcast(Topic::Group(1), "hello".to_string()).await;

        assert_eq!(group_rx.recv().await.as_deref(), Some("hello"));
        assert!(chat_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_dropped() {
        let registry = ConnectionRegistry::new();
        let (_, rx) = registry.add_subscriber(Topic::Chat(3)).await;
        let (_, _live_rx) = registry.add_subscriber(Topic::Chat(3)).await;
        drop(rx);

        registry.broadcast(Topic::Chat(3), "ping".to_string()).await;
        assert_eq!(registry.subscriber_count(Topic::Chat(3)).await, 1);
    }

    #[tokio::test]
    async fn test_remove_last_subscriber_clears_topic() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = registry.add_subscriber(Topic::Group(9)).await;
        registry.remove_subscriber(Topic::Group(9), id).await;
        assert_eq!(registry.subscriber_count(Topic::Group(9)).await, 0);
    }
}
