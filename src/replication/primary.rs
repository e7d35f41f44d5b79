use anyhow::Result;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;

use super::protocol::SyncFrame;
use crate::config::Config;
use crate::state::types::now_secs;
use crate::state::StateStore;

/// Primary-side replication: one snapshot frame plus one heartbeat frame
/// per sync interval, multicast to wherever a backup may be listening.
pub struct StateSyncer {
    state: Arc<StateStore>,
    socket: UdpSocket,
    target: SocketAddrV4,
    interval: std::time::Duration,
}

impl StateSyncer {
    pub async fn open(config: &Config, state: Arc<StateStore>) -> Result<Arc<Self>> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_multicast_ttl_v4(2)?;

        Ok(Arc::new(Self {
            state,
            socket,
            target: SocketAddrV4::new(config.multicast_group, config.multicast_port),
            interval: config.sync_interval,
        }))
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!("Broadcasting state to backups at {}", self.target);
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            self.sync_once().await;
        }
    }

    /// One replication cycle. Send errors are logged and forgotten: the
    /// next cycle carries a fresher snapshot anyway.
    pub async fn sync_once(&self) {
        let snapshot = match self.state.get_state_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Failed to snapshot state: {}", e);
                return;
            }
        };

        self.send_frame(SyncFrame::Snapshot(snapshot)).await;
        self.send_frame(SyncFrame::Heartbeat(now_secs())).await;
    }

    async fn send_frame(&self, frame: SyncFrame) {
        let encoded = match frame.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!("Failed to encode sync frame: {}", e);
                return;
            }
        };

        if let Err(e) = self.socket.send_to(&encoded, self.target).await {
            tracing::warn!("Failed to multicast sync frame: {}", e);
        }
    }
}
