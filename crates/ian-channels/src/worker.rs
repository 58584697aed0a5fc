use async_trait::async_trait;
use ian_core::types::InboundMessage;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Default bound on a channel's worker queue. The poller blocks on enqueue
/// once full, which is the intended backpressure: the platform request
/// already completed, so throttling here only slows how fast the cursor
/// advances.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// An item on a worker's queue. `Shutdown` is pushed explicitly during
/// graceful shutdown rather than relying on the sender being dropped, so the
/// worker can distinguish "queue closed unexpectedly" from "asked to stop".
pub enum WorkerItem {
    Message(InboundMessage),
    Shutdown,
}

/// Whatever drives a single message through the dispatch pipeline. Kept as a
/// trait so this crate never depends on `ian-dispatcher` — the dispatcher
/// depends on `ian-channels`, not the other way around.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, msg: InboundMessage);
}

/// One worker per channel: a single task draining that channel's queue
/// strictly in FIFO order, so messages within a channel are always
/// processed in the order they were received.
pub struct Worker<H: MessageHandler> {
    pub channel_name: String,
    pub queue_rx: mpsc::Receiver<WorkerItem>,
    pub handler: H,
}

impl<H: MessageHandler> Worker<H> {
    pub async fn run(mut self) {
        while let Some(item) = self.queue_rx.recv().await {
            match item {
                WorkerItem::Message(msg) => self.handler.handle(msg).await,
                WorkerItem::Shutdown => {
                    info!(channel = %self.channel_name, "worker received shutdown sentinel");
                    return;
                }
            }
        }
        warn!(channel = %self.channel_name, "worker queue closed without a shutdown sentinel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ian_core::types::ChannelId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, _msg: InboundMessage) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample() -> InboundMessage {
        InboundMessage {
            ts: "1.0".to_string(),
            user: "U1".to_string(),
            text: "hi".to_string(),
            channel: ChannelId::from("C1"),
            thread_ts: None,
            subtype: None,
        }
    }

    #[tokio::test]
    async fn processes_messages_in_order_then_stops_on_shutdown() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(10);
        let worker = Worker {
            channel_name: "C1".to_string(),
            queue_rx: rx,
            handler: CountingHandler(counter.clone()),
        };
        let handle = tokio::spawn(worker.run());

        tx.send(WorkerItem::Message(sample())).await.unwrap();
        tx.send(WorkerItem::Message(sample())).await.unwrap();
        tx.send(WorkerItem::Shutdown).await.unwrap();

        handle.await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
