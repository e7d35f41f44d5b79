use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use super::types::{now_secs, Task, TaskStatus, WorkerEntry};
use crate::clock::LamportClock;

/// Wire shape of a replication snapshot. Field names double as the JSON keys
/// the backup decodes, so primary and backup agree by construction.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tasks: HashMap<String, Task>,
    pub pending_tasks: Vec<String>,
    pub workers: HashMap<String, WorkerEntry>,
}

struct StateInner {
    tasks: HashMap<String, Task>,
    pending: VecDeque<String>,
    workers: HashMap<String, WorkerEntry>,
}

/// Authoritative store of tasks, the pending queue and worker liveness.
///
/// Every public operation takes the one internal lock for its whole duration,
/// so callers observe the store only at operation boundaries. The lock is
/// never held across I/O.
pub struct StateStore {
    worker_timeout: Duration,
    inner: Mutex<StateInner>,
}

impl StateStore {
    pub fn new(worker_timeout: Duration) -> Self {
        Self {
            worker_timeout,
            inner: Mutex::new(StateInner {
                tasks: HashMap::new(),
                pending: VecDeque::new(),
                workers: HashMap::new(),
            }),
        }
    }

    /// Inserts (or re-inserts) a task and appends its id to the pending
    /// queue. Re-queued tasks must already be reset to `Pending` with no
    /// assigned worker by the caller.
    pub fn add_task(&self, task: Task) {
        let mut inner = self.inner.lock().unwrap();
        let task_id = task.id.clone();
        inner.tasks.insert(task_id.clone(), task);
        inner.pending.push_back(task_id.clone());
        tracing::info!("Task {} queued", task_id);
    }

    /// Removes the head of the pending queue and flips it to `InProgress` in
    /// the same critical section, so no observer can see a task dequeued but
    /// still pending.
    pub fn get_next_task(&self) -> Option<Task> {
        let mut inner = self.inner.lock().unwrap();
        let task_id = inner.pending.pop_front()?;
        let task = inner.tasks.get_mut(&task_id)?;
        task.status = TaskStatus::InProgress;
        Some(task.clone())
    }

    /// Upserts a worker's liveness entry from an observed heartbeat.
    pub fn update_worker_heartbeat(&self, worker_id: &str, source: SocketAddr) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.workers.contains_key(worker_id) {
            tracing::info!("New worker registered: {} at {}", worker_id, source);
        }
        inner.workers.insert(
            worker_id.to_string(),
            WorkerEntry {
                addr: (source.ip().to_string(), source.port()),
                last_heartbeat: now_secs(),
            },
        );
    }

    /// Sweeps the worker table: entries silent for longer than the timeout
    /// are removed and their in-progress tasks are reset to `Pending` and
    /// prepended to the queue. Returns the ids still considered active.
    pub fn check_dead_workers(&self) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        let now = now_secs();
        let timeout = self.worker_timeout.as_secs_f64();

        let dead: Vec<String> = inner
            .workers
            .iter()
            .filter(|(_, entry)| now - entry.last_heartbeat > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for worker_id in &dead {
            tracing::warn!("Worker {} is inactive, reassigning its tasks", worker_id);
            inner.workers.remove(worker_id);

            let rescued: Vec<String> = inner
                .tasks
                .values_mut()
                .filter(|task| {
                    task.status == TaskStatus::InProgress
                        && task.assigned_worker.as_deref() == Some(worker_id.as_str())
                })
                .map(|task| {
                    task.status = TaskStatus::Pending;
                    task.assigned_worker = None;
                    task.id.clone()
                })
                .collect();

            for task_id in rescued {
                inner.pending.push_front(task_id.clone());
                tracing::info!("Task {} returned to the queue head", task_id);
            }
        }

        inner.workers.keys().cloned().collect()
    }

    /// Records which worker a task was dispatched to.
    pub fn mark_assigned(&self, task_id: &str, worker_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.tasks.get_mut(task_id) {
            task.assigned_worker = Some(worker_id.to_string());
        }
    }

    /// Sets a task's status and result. Unknown ids are tolerated silently:
    /// a completion for a task this replica never saw is dropped, and
    /// re-delivered completions simply overwrite with the same values.
    pub fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        result: Option<serde_json::Value>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.tasks.get_mut(task_id) {
            task.status = status;
            task.result = result;
            tracing::info!("Task {} status updated to {:?}", task_id, status);
        }
    }

    /// Snapshot view of one task's current attributes.
    pub fn get_task_status(&self, task_id: &str) -> Option<Task> {
        let inner = self.inner.lock().unwrap();
        inner.tasks.get(task_id).cloned()
    }

    /// Host half of a worker's last observed heartbeat source address.
    pub fn worker_host(&self, worker_id: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.workers.get(worker_id).map(|entry| entry.addr.0.clone())
    }

    /// Serializes a point-in-time view of the whole store.
    pub fn get_state_snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = {
            let inner = self.inner.lock().unwrap();
            StateSnapshot {
                tasks: inner.tasks.clone(),
                pending_tasks: inner.pending.iter().cloned().collect(),
                workers: inner.workers.clone(),
            }
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    /// Replaces the whole store from an encoded snapshot and realigns the
    /// Lamport clock with the highest timestamp it carries. A snapshot that
    /// fails to decode leaves both the store and the clock untouched.
    pub fn load_state_snapshot(&self, bytes: &[u8], clock: &LamportClock) -> Result<()> {
        let snapshot: StateSnapshot = serde_json::from_slice(bytes)?;

        let max_ts = snapshot
            .tasks
            .values()
            .map(|task| task.lamport_ts)
            .max()
            .unwrap_or(0);

        let mut inner = self.inner.lock().unwrap();
        inner.tasks = snapshot.tasks;
        inner.pending = snapshot.pending_tasks.into();
        inner.workers = snapshot.workers;
        drop(inner);

        clock.set_time(max_ts);
        tracing::info!("State synchronized from primary snapshot");
        Ok(())
    }

    /// Number of tasks in the table, pending queue length, worker count.
    pub fn counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.tasks.len(), inner.pending.len(), inner.workers.len())
    }

    /// Ids currently in the pending queue, head first.
    pub fn pending_ids(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.pending.iter().cloned().collect()
    }
}
