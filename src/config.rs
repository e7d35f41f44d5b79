//! Platform Configuration
//!
//! One `Config` value carries every tunable of the platform: network
//! addresses, replication/liveness timing and the credential store. The
//! orchestrator, worker and client binaries build a `Config` in `main` and
//! hand it to the components they start; nothing reads process-wide globals.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Host the orchestrator binds on; also the host workers and clients
    /// connect to.
    pub host: String,
    /// TCP port for client submissions and status queries.
    pub client_port: u16,
    /// UDP port for worker heartbeats and completion notices.
    pub worker_port: u16,
    /// IPv4 multicast group used for primary/backup state sync.
    pub multicast_group: Ipv4Addr,
    pub multicast_port: u16,
    /// Silence window after which the backup declares the primary dead.
    pub primary_timeout: Duration,
    /// Period of the primary's snapshot + heartbeat broadcast.
    pub sync_interval: Duration,
    /// Silence window after which a worker is declared dead.
    pub worker_timeout: Duration,
    /// Period of the worker's own heartbeat sender.
    pub heartbeat_interval: Duration,
    /// Credential store: username -> password.
    pub users: HashMap<String, String>,
    /// Shared secret mixed into authentication tokens.
    pub secret_key: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut users = HashMap::new();
        users.insert("user1".to_string(), "pass1".to_string());
        users.insert("user2".to_string(), "pass2".to_string());

        Self {
            host: "localhost".to_string(),
            client_port: 50051,
            worker_port: 50052,
            multicast_group: Ipv4Addr::new(224, 1, 1, 1),
            multicast_port: 5007,
            primary_timeout: Duration::from_secs(5),
            sync_interval: Duration::from_secs(2),
            worker_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(2),
            users,
            secret_key: "sua-chave-super-secreta".to_string(),
        }
    }
}
