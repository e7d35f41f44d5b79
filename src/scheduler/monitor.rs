use std::sync::Arc;
use std::time::Duration;

use super::round_robin::RoundRobinRotation;
use crate::state::StateStore;

/// Periodic liveness sweep. Each tick removes workers whose heartbeats have
/// lapsed (rescuing their in-flight tasks) and hands the surviving set to
/// the round-robin rotation.
pub struct LivenessMonitor {
    state: Arc<StateStore>,
    rotation: Arc<RoundRobinRotation>,
    period: Duration,
}

impl LivenessMonitor {
    pub fn new(
        state: Arc<StateStore>,
        rotation: Arc<RoundRobinRotation>,
        period: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            state,
            rotation,
            period,
        })
    }

    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.period);

        loop {
            interval.tick().await;
            self.sweep();
        }
    }

    /// One sweep: prune dead workers, refresh the rotation.
    pub fn sweep(&self) {
        let active = self.state.check_dead_workers();
        self.rotation.update_workers(active);
    }
}
