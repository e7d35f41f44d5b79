use serde::{Deserialize, Serialize};

/// Heartbeat datagrams are tiny; completions may carry a result payload up
/// to the UDP maximum.
pub const MAX_DATAGRAM_BYTES: usize = 65507;

/// Task-assignment frames mirror the client framing: one JSON object of at
/// most 4 KiB per connection.
pub const MAX_TASK_FRAME_BYTES: usize = 4096;

/// The closed set of datagrams workers send to the orchestrator's UDP port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerDatagram {
    Heartbeat {
        worker_id: String,
    },
    TaskComplete {
        task_id: String,
        result: serde_json::Value,
    },
}

/// Extracts the task-listening TCP port from a worker id of the form
/// `<host>_<port>`.
pub fn task_port(worker_id: &str) -> Option<u16> {
    worker_id.rsplit('_').next()?.parse().ok()
}
