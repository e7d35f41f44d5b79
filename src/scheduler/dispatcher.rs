use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::protocol::task_port;
use super::round_robin::RoundRobinRotation;
use crate::state::{StateStore, Task, TaskStatus};

const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_secs(1);
const NO_WORKER_BACKOFF: Duration = Duration::from_secs(2);

/// What one pass of the dispatch loop did, and therefore how long to back
/// off before the next pass.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    QueueEmpty,
    NoWorker,
    SendFailed,
}

/// Pull loop between the pending queue and the worker fleet.
pub struct TaskDispatcher {
    state: Arc<StateStore>,
    rotation: Arc<RoundRobinRotation>,
}

impl TaskDispatcher {
    pub fn new(state: Arc<StateStore>, rotation: Arc<RoundRobinRotation>) -> Arc<Self> {
        Arc::new(Self { state, rotation })
    }

    pub async fn run(self: Arc<Self>) {
        loop {
            match self.dispatch_cycle().await {
                DispatchOutcome::Dispatched | DispatchOutcome::SendFailed => {}
                DispatchOutcome::QueueEmpty => tokio::time::sleep(EMPTY_QUEUE_BACKOFF).await,
                DispatchOutcome::NoWorker => tokio::time::sleep(NO_WORKER_BACKOFF).await,
            }
        }
    }

    /// One pass: pop the queue head, pick a worker, push the task.
    ///
    /// Failures never reach the submitting client: the task is reset to
    /// pending and re-queued at the tail, and the loop moves on.
    pub async fn dispatch_cycle(&self) -> DispatchOutcome {
        let Some(task) = self.state.get_next_task() else {
            return DispatchOutcome::QueueEmpty;
        };

        let Some(worker_id) = self.rotation.get_next_worker() else {
            tracing::warn!("No worker available, returning task {} to the queue", task.id);
            self.requeue(task);
            return DispatchOutcome::NoWorker;
        };

        match self.send_task(&task, &worker_id).await {
            Ok(()) => {
                self.state.mark_assigned(&task.id, &worker_id);
                tracing::info!("Task {} sent to {}", task.id, worker_id);
                DispatchOutcome::Dispatched
            }
            Err(e) => {
                tracing::error!(
                    "Failed to send task {} to {}: {}. Re-queueing.",
                    task.id,
                    worker_id,
                    e
                );
                self.requeue(task);
                DispatchOutcome::SendFailed
            }
        }
    }

    /// One-shot TCP push of the full task record. The target host is the
    /// source of the worker's last heartbeat; the port is the suffix of its
    /// id.
    async fn send_task(&self, task: &Task, worker_id: &str) -> Result<()> {
        let host = self
            .state
            .worker_host(worker_id)
            .ok_or_else(|| anyhow!("worker {} missing from the worker table", worker_id))?;
        let port = task_port(worker_id)
            .ok_or_else(|| anyhow!("worker id {} carries no task port", worker_id))?;

        let mut record = task.clone();
        record.assigned_worker = Some(worker_id.to_string());
        let frame = serde_json::to_vec(&record)?;

        let mut stream = TcpStream::connect((host.as_str(), port)).await?;
        stream.write_all(&frame).await?;
        Ok(())
    }

    fn requeue(&self, mut task: Task) {
        task.status = TaskStatus::Pending;
        task.assigned_worker = None;
        self.state.add_task(task);
    }
}
