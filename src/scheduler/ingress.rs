use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

use super::protocol::{WorkerDatagram, MAX_DATAGRAM_BYTES};
use crate::config::Config;
use crate::state::{StateStore, TaskStatus};

/// UDP receiver for worker traffic: heartbeats and task completions.
pub struct WorkerIngress {
    state: Arc<StateStore>,
    socket: UdpSocket,
}

impl WorkerIngress {
    /// Binds the worker-facing UDP port. A bind failure here is fatal to
    /// startup.
    pub async fn bind(config: &Config, state: Arc<StateStore>) -> Result<Arc<Self>> {
        let socket = UdpSocket::bind((config.host.as_str(), config.worker_port)).await?;
        tracing::info!(
            "Listening for workers on {}:{} (UDP)",
            config.host,
            config.worker_port
        );
        Ok(Arc::new(Self { state, socket }))
    }

    /// Address the ingress socket actually bound (the configured port may
    /// be 0 in tests).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn serve(self: Arc<Self>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, src)) => match serde_json::from_slice::<WorkerDatagram>(&buf[..len]) {
                    Ok(datagram) => self.handle_datagram(datagram, src),
                    Err(e) => {
                        tracing::warn!("Dropping malformed worker datagram from {}: {}", src, e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to receive worker datagram: {}", e);
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    pub fn handle_datagram(&self, datagram: WorkerDatagram, src: SocketAddr) {
        match datagram {
            WorkerDatagram::Heartbeat { worker_id } => {
                self.state.update_worker_heartbeat(&worker_id, src);
            }
            WorkerDatagram::TaskComplete { task_id, result } => {
                self.state
                    .update_task_status(&task_id, TaskStatus::Completed, Some(result));
            }
        }
    }
}
