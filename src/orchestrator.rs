//! Orchestrator Assembly
//!
//! Builds the core components (state store, Lamport clock, round-robin
//! rotation) and runs the services that fit the replica's role. A primary
//! runs everything; a backup runs only the sync listener until failover
//! promotes it, at which point the primary services start on top of the
//! state it accumulated.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::api::ClientApi;
use crate::clock::LamportClock;
use crate::config::Config;
use crate::replication::{BackupListener, StateSyncer};
use crate::scheduler::{LivenessMonitor, RoundRobinRotation, TaskDispatcher, WorkerIngress};
use crate::state::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Backup,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "PRIMARY"),
            Role::Backup => write!(f, "BACKUP"),
        }
    }
}

pub struct Orchestrator {
    config: Arc<Config>,
    state: Arc<StateStore>,
    clock: Arc<LamportClock>,
    rotation: Arc<RoundRobinRotation>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let state = Arc::new(StateStore::new(config.worker_timeout));
        Self {
            config: Arc::new(config),
            state,
            clock: Arc::new(LamportClock::new()),
            rotation: Arc::new(RoundRobinRotation::new()),
        }
    }

    /// Runs forever (or until a listening socket cannot be bound, the one
    /// fatal startup condition).
    pub async fn run(self, role: Role) -> Result<()> {
        tracing::info!("Orchestrator starting in {} mode", role);

        if role == Role::Backup {
            let listener = BackupListener::join(
                &self.config,
                self.state.clone(),
                self.clock.clone(),
            )
            .await?;
            listener.run_until_failover().await;
            tracing::info!("PROMOTING TO PRIMARY");
        }

        self.start_primary_services().await?;

        // Services run as detached tasks; the main task just parks.
        std::future::pending::<()>().await;
        Ok(())
    }

    /// Binds every listening socket first, then spawns the service loops.
    /// Bind errors propagate out and abort startup.
    async fn start_primary_services(&self) -> Result<()> {
        let api = ClientApi::bind(
            self.config.clone(),
            self.state.clone(),
            self.clock.clone(),
        )
        .await?;
        tokio::spawn(api.serve());

        let ingress = WorkerIngress::bind(&self.config, self.state.clone()).await?;
        tokio::spawn(ingress.serve());

        let dispatcher = TaskDispatcher::new(self.state.clone(), self.rotation.clone());
        tokio::spawn(dispatcher.run());

        let monitor = LivenessMonitor::new(
            self.state.clone(),
            self.rotation.clone(),
            self.config.worker_timeout,
        );
        tokio::spawn(monitor.run());

        let syncer = StateSyncer::open(&self.config, self.state.clone()).await?;
        tokio::spawn(syncer.run());

        tracing::info!("Primary orchestrator services started");
        Ok(())
    }
}
