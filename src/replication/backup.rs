use anyhow::Result;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

use super::protocol::{SyncFrame, MAX_FRAME_BYTES};
use crate::clock::LamportClock;
use crate::config::Config;
use crate::state::StateStore;

/// Backup-side replication: consumes the primary's multicast frames and
/// decides when the primary is gone.
pub struct BackupListener {
    state: Arc<StateStore>,
    clock: Arc<LamportClock>,
    socket: UdpSocket,
    primary_timeout: Duration,
}

impl BackupListener {
    /// Joins the multicast group. A bind failure here is fatal to startup.
    pub async fn join(
        config: &Config,
        state: Arc<StateStore>,
        clock: Arc<LamportClock>,
    ) -> Result<Self> {
        let socket =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.multicast_port)).await?;
        socket.join_multicast_v4(config.multicast_group, Ipv4Addr::UNSPECIFIED)?;
        tracing::info!(
            "Backup listening for primary sync on {}:{}",
            config.multicast_group,
            config.multicast_port
        );

        Ok(Self {
            state,
            clock,
            socket,
            primary_timeout: config.primary_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Consumes sync traffic until the primary goes silent for longer than
    /// the timeout, then returns so the caller can promote this replica.
    /// The state and clock filled in along the way are kept as-is.
    pub async fn run_until_failover(&self) {
        let mut last_primary_heartbeat = Instant::now();
        let mut buf = vec![0u8; MAX_FRAME_BYTES];

        loop {
            if last_primary_heartbeat.elapsed() > self.primary_timeout {
                tracing::warn!("No heartbeat from the primary. Starting failover!");
                return;
            }

            match tokio::time::timeout(self.primary_timeout, self.socket.recv_from(&mut buf))
                .await
            {
                Ok(Ok((len, _))) => self.handle_datagram(&buf[..len], &mut last_primary_heartbeat),
                Ok(Err(e)) => {
                    tracing::error!("Failed to receive sync datagram: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Err(_) => {
                    // Silence; the check at the top of the loop decides.
                    tracing::warn!("Timed out waiting for primary traffic");
                }
            }
        }
    }

    pub fn handle_datagram(&self, datagram: &[u8], last_primary_heartbeat: &mut Instant) {
        match SyncFrame::decode(datagram) {
            Ok(SyncFrame::Snapshot(body)) => {
                if let Err(e) = self.state.load_state_snapshot(&body, &self.clock) {
                    tracing::error!("Failed to load state snapshot: {}", e);
                }
            }
            Ok(SyncFrame::Heartbeat(_)) => {
                *last_primary_heartbeat = Instant::now();
            }
            Err(e) => {
                tracing::warn!("Dropping malformed sync datagram: {}", e);
            }
        }
    }
}
