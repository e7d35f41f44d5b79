//! Replication Module
//!
//! Warm-standby replication between two orchestrator replicas over IPv4
//! multicast.
//!
//! ## Core Mechanisms
//! - **Snapshot shipping**: the primary periodically multicasts a complete
//!   state snapshot. Datagram loss is tolerated; the next cycle overwrites.
//! - **Primary heartbeats**: a second frame per cycle carries a wall-clock
//!   timestamp proving the primary is alive.
//! - **Failover**: the backup applies snapshots as they arrive and promotes
//!   itself once the primary has been silent past the timeout. The state
//!   store and clock it accumulated stay in place; only the services change.
//!
//! There is no demotion path. A former primary that comes back keeps acting
//! as primary; running two primaries is a known, unmitigated limitation.

pub mod backup;
pub mod primary;
pub mod protocol;

pub use backup::BackupListener;
pub use primary::StateSyncer;
