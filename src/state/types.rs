use serde::{Deserialize, Serialize};

/// Lifecycle state of a task. The serialized spelling doubles as the wire
/// value seen by clients and workers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One unit of client-submitted work plus its lifecycle metadata.
///
/// The same record travels everywhere: it is stored in the task table,
/// serialized to workers on dispatch and embedded in replication snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Globally unique id (UUIDv4 rendered as text).
    pub id: String,
    /// Username of the submitting client.
    pub client_id: String,
    pub status: TaskStatus,
    /// Opaque client payload. Workers read `duration` out of it.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Logical timestamp assigned at submission.
    pub lamport_ts: u64,
    /// Id of the worker the task was last dispatched to. `None` while the
    /// task sits in the pending queue.
    #[serde(default)]
    pub assigned_worker: Option<String>,
    /// Present once the task has completed.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl Task {
    pub fn new(client_id: String, data: serde_json::Value, lamport_ts: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id,
            status: TaskStatus::Pending,
            data,
            lamport_ts,
            assigned_worker: None,
            result: None,
        }
    }
}

/// Liveness record for one worker, keyed in the store by its id
/// (`<host>_<task-port>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerEntry {
    /// Source address of the worker's heartbeats: (host, udp source port).
    /// The host half is reused as the dispatch target; the task port comes
    /// from the worker id suffix.
    pub addr: (String, u16),
    /// Wall-clock seconds of the last heartbeat.
    pub last_heartbeat: f64,
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
