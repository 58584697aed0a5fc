use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ian_core::types::{ChannelId, ChannelKind};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::platform::ChatPlatform;
use crate::poller::Poller;
use crate::worker::{MessageHandler, Worker, WorkerItem, DEFAULT_QUEUE_CAPACITY};

/// One channel's poller + worker pair, spawned as independent tasks.
struct ChannelTasks {
    queue_tx: mpsc::Sender<WorkerItem>,
    poller: JoinHandle<()>,
    worker: JoinHandle<()>,
}

/// Owns every monitored channel's poller/worker pair and coordinates
/// graceful shutdown: flips the shared `watch<bool>`, pushes a `Shutdown`
/// sentinel onto every worker queue, then joins everything with a bounded
/// timeout.
pub struct ChannelRuntime {
    tasks: Vec<ChannelTasks>,
    shutdown_tx: watch::Sender<bool>,
}

impl ChannelRuntime {
    /// Spawn a poller/worker pair for every `(channel_id, kind)` entry,
    /// sharing one `ChatPlatform`, one owner id, and one set of agent
    /// identities to exclude from dispatch.
    pub fn spawn<H>(
        channels: Vec<(ChannelId, ChannelKind)>,
        platform: Arc<dyn ChatPlatform>,
        owner_user_id: String,
        agent_user_ids: HashSet<String>,
        poll_interval: Duration,
        handler_factory: impl Fn() -> H,
    ) -> Self
    where
        H: MessageHandler + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(channels.len());

        for (channel_id, kind) in channels {
            let (queue_tx, queue_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);

            let poller = Poller {
                channel_id: channel_id.clone(),
                kind,
                platform: platform.clone(),
                queue_tx: queue_tx.clone(),
                poll_interval,
                owner_user_id: owner_user_id.clone(),
                agent_user_ids: agent_user_ids.clone(),
                shutdown: shutdown_rx.clone(),
            };
            let poller_handle = tokio::spawn(poller.run());

            let worker = Worker {
                channel_name: channel_id.as_str().to_string(),
                queue_rx,
                handler: handler_factory(),
            };
            let worker_handle = tokio::spawn(worker.run());

            tasks.push(ChannelTasks {
                queue_tx,
                poller: poller_handle,
                worker: worker_handle,
            });
        }

        Self { tasks, shutdown_tx }
    }

    /// Signal every poller to stop, push a shutdown sentinel into every
    /// worker queue, then wait for all tasks to finish, bounded by `timeout`.
    pub async fn shutdown(self, timeout: Duration) {
        info!(channels = self.tasks.len(), "channel runtime shutting down");
        let _ = self.shutdown_tx.send(true);

        for task in &self.tasks {
            let _ = task.queue_tx.send(WorkerItem::Shutdown).await;
        }

        let joins = self
            .tasks
            .into_iter()
            .flat_map(|t| [t.poller, t.worker]);

        let _ = tokio::time::timeout(timeout, futures_join_all(joins)).await;
    }
}

async fn futures_join_all(handles: impl Iterator<Item = JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}
