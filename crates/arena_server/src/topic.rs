use crate::types::ServerEvent;
use tokio::sync::broadcast;

/// Buffered events per subscriber before lagging kicks in.
const TOPIC_CAPACITY: usize = 256;

/// Per-match event topic. All subscribers observe the actor's publish order;
/// a slow subscriber lags and loses old events rather than blocking the
/// simulation.
#[derive(Clone)]
pub struct MatchTopic {
    tx: broadcast::Sender<ServerEvent>,
}

impl MatchTopic {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(TOPIC_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget publish; an error just means nobody is listening.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MatchTopic {
    fn default() -> Self {
        Self::new()
    }
}
