//! Scheduling Module
//!
//! Everything between the pending queue and the worker fleet:
//!
//! - **`ingress`**: UDP receiver for worker heartbeats and task completions.
//! - **`monitor`**: periodic liveness sweep; dead workers are dropped, their
//!   in-flight tasks rescued, and the rotation refreshed with the survivors.
//! - **`round_robin`**: cyclic selection over the sorted active worker set.
//!   Sorting makes the rotation deterministic regardless of map iteration
//!   order, so two orchestrators seeing the same active set assign in the
//!   same sequence.
//! - **`dispatcher`**: pull loop that pops the queue head, picks a worker and
//!   pushes the task record over a one-shot TCP connection. Any failure puts
//!   the task back in the queue; the submitting client never sees it.

pub mod dispatcher;
pub mod ingress;
pub mod monitor;
pub mod protocol;
pub mod round_robin;

pub use dispatcher::TaskDispatcher;
pub use ingress::WorkerIngress;
pub use monitor::LivenessMonitor;
pub use round_robin::RoundRobinRotation;
