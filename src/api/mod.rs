//! Client Endpoint Module
//!
//! TCP front door for task submitters. Connections are one-shot: the client
//! sends a single JSON request of at most 4 KiB, the orchestrator answers
//! with a single JSON object and closes.
//!
//! ## Core Mechanisms
//! - **Closed action set**: requests are decoded into a tagged enum
//!   (`login`, `submit_task`, `task_status`); anything else is dropped as
//!   malformed.
//! - **Stateless tokens**: a token is `hex(sha256(username || secret_key))`.
//!   There is no expiry or revocation; the scheme is a deliberate
//!   simplification, suitable as a test fixture but not a security primitive.
//! - **Submission stamping**: each accepted task gets a fresh UUID and the
//!   next Lamport timestamp before entering the pending queue.

pub mod auth;
pub mod protocol;
pub mod service;

pub use service::ClientApi;

#[cfg(test)]
mod tests;
