//! Orchestrator State Module
//!
//! Authoritative in-memory store of everything the orchestrator knows:
//! the task table, the FIFO queue of pending task ids and the worker
//! liveness table.
//!
//! ## Core Mechanisms
//! - **Single mutex**: all three collections live behind one lock, so every
//!   operation is externally atomic and a snapshot is a point-in-time
//!   consistent view. No operation ever holds a second lock.
//! - **Queue discipline**: new submissions and dispatch-failure re-queues go
//!   to the tail; tasks rescued from a dead worker go to the head so recovery
//!   is expedited.
//! - **Replication hooks**: `get_state_snapshot`/`load_state_snapshot`
//!   serialize and wholesale-replace the store for primary/backup sync.

pub mod store;
pub mod types;

pub use store::StateStore;
pub use types::{Task, TaskStatus, WorkerEntry};

#[cfg(test)]
mod tests;
