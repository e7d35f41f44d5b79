//! Worker Process Module
//!
//! The executing side of the platform. A worker announces itself by sending
//! heartbeats to the orchestrator's UDP port, accepts task records on its
//! own TCP port, simulates the work by sleeping for the task's `duration`,
//! and acknowledges completion with a fire-and-forget datagram.
//!
//! Tasks are executed one at a time, in arrival order; the heartbeat sender
//! keeps running while a task is in progress.

use anyhow::Result;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};

use crate::config::Config;
use crate::scheduler::protocol::WorkerDatagram;
use crate::state::Task;

/// Simulated execution time when a task carries no `duration`.
const DEFAULT_DURATION_SECS: u64 = 5;

/// Runs one worker process: heartbeat sender plus task listener.
pub async fn run(config: Config, host: String, task_port: u16) -> Result<()> {
    let worker_id = format!("{}_{}", host, task_port);
    tracing::info!("Worker {} starting", worker_id);

    tokio::spawn(heartbeat_loop(config.clone(), worker_id));
    listen_for_tasks(config, host, task_port).await
}

/// Periodically tells the orchestrator this worker is alive. One socket for
/// the whole loop: the orchestrator keys the worker's host off the source
/// address it observes.
async fn heartbeat_loop(config: Config, worker_id: String) {
    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(e) => {
            tracing::error!("Failed to open heartbeat socket: {}", e);
            return;
        }
    };

    let frame = match serde_json::to_vec(&WorkerDatagram::Heartbeat { worker_id }) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode heartbeat: {}", e);
            return;
        }
    };

    let mut interval = tokio::time::interval(config.heartbeat_interval);
    loop {
        interval.tick().await;
        if let Err(e) = socket
            .send_to(&frame, (config.host.as_str(), config.worker_port))
            .await
        {
            tracing::error!("Failed to send heartbeat: {}", e);
        }
    }
}

/// Accepts one-shot task connections and executes each task in turn.
async fn listen_for_tasks(config: Config, host: String, task_port: u16) -> Result<()> {
    let listener = TcpListener::bind((host.as_str(), task_port)).await?;
    tracing::info!("Listening for tasks on {}:{}", host, task_port);

    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!("Failed to accept task connection: {}", e);
                continue;
            }
        };

        let mut raw = Vec::new();
        if let Err(e) = stream.read_to_end(&mut raw).await {
            tracing::error!("Error reading task from {}: {}", peer, e);
            continue;
        }
        drop(stream);

        let task = match serde_json::from_slice::<Task>(&raw) {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!("Dropping malformed task record from {}: {}", peer, e);
                continue;
            }
        };

        let result = execute_task(&task).await;
        notify_completion(&config, &task.id, result).await;
    }
}

/// Simulates the work: sleep for the requested duration, report success.
async fn execute_task(task: &Task) -> serde_json::Value {
    tracing::info!("Executing task {}", task.id);

    let duration = task
        .data
        .get("duration")
        .and_then(|value| value.as_u64())
        .unwrap_or(DEFAULT_DURATION_SECS);
    tokio::time::sleep(std::time::Duration::from_secs(duration)).await;

    tracing::info!("Task {} finished", task.id);
    serde_json::json!({
        "message": format!("Task {} completed successfully", task.id)
    })
}

/// Fire-and-forget completion notice back to the orchestrator.
async fn notify_completion(config: &Config, task_id: &str, result: serde_json::Value) {
    let datagram = WorkerDatagram::TaskComplete {
        task_id: task_id.to_string(),
        result,
    };
    let frame = match serde_json::to_vec(&datagram) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode completion notice: {}", e);
            return;
        }
    };

    match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => {
            if let Err(e) = socket
                .send_to(&frame, (config.host.as_str(), config.worker_port))
                .await
            {
                tracing::error!("Failed to send completion notice: {}", e);
            } else {
                tracing::info!("Completion notice for task {} sent", task_id);
            }
        }
        Err(e) => tracing::error!("Failed to open completion socket: {}", e),
    }
}
