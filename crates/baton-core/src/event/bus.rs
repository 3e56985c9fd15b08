use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use tracing::{trace, warn};

use super::Event;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Consumer of run events.
///
/// Each subscriber is fed from its own bounded queue by a dedicated worker, so
/// a slow subscriber never stalls the runner. Events that do not fit the queue
/// are dropped.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    fn name(&self) -> &'static str;

    fn queue_capacity(&self) -> usize {
        DEFAULT_QUEUE_CAPACITY
    }
}

enum Delivery {
    Event(Arc<Event>),
    /// Acknowledged once every event queued before it has been handled.
    Flush(oneshot::Sender<()>),
}

struct Queue {
    name: &'static str,
    tx: mpsc::Sender<Delivery>,
}

/// Fan-out of events to subscribers.
#[derive(Clone, Default)]
pub struct Bus {
    queues: Arc<Vec<Queue>>,
}

impl Bus {
    /// Spawn one delivery worker per subscriber.
    ///
    /// Must be called inside a tokio runtime unless `subscribers` is empty.
    pub fn new(subscribers: &[Arc<dyn Subscribe>]) -> Self {
        let queues = subscribers
            .iter()
            .map(|sub| {
                let (tx, mut rx) = mpsc::channel::<Delivery>(sub.queue_capacity().max(1));
                let sub = Arc::clone(sub);
                let name = sub.name();
                tokio::spawn(async move {
                    while let Some(delivery) = rx.recv().await {
                        match delivery {
                            Delivery::Event(event) => sub.on_event(&event).await,
                            Delivery::Flush(ack) => {
                                let _ = ack.send(());
                            }
                        }
                    }
                    trace!(subscriber = name, "subscriber queue closed");
                });
                Queue { name, tx }
            })
            .collect();

        Self {
            queues: Arc::new(queues),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Deliver `event` to every subscriber without waiting.
    pub fn publish(&self, event: Event) {
        if self.queues.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for queue in self.queues.iter() {
            match queue.tx.try_send(Delivery::Event(Arc::clone(&event))) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => warn!(
                    subscriber = queue.name,
                    kind = ?event.kind,
                    "event dropped for a subscriber (queue full)"
                ),
                Err(TrySendError::Closed(_)) => trace!(
                    subscriber = queue.name,
                    kind = ?event.kind,
                    "event dropped for a subscriber (worker closed)"
                ),
            }
        }
    }

    /// Wait until every subscriber has handled the events published so far.
    pub async fn flush(&self) {
        for queue in self.queues.iter() {
            let (ack, done) = oneshot::channel();
            if queue.tx.send(Delivery::Flush(ack)).await.is_err() {
                continue;
            }
            if done.await.is_err() {
                trace!(subscriber = queue.name, "subscriber worker gone before flush");
            }
        }
    }
}
