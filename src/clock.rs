//! Lamport Logical Clock
//!
//! A single monotonic counter used to impose a causal order on task
//! submissions. The orchestrator advances it once per submission (internal
//! event rule); the backup overwrites it when it loads a state snapshot.

use std::sync::Mutex;

pub struct LamportClock {
    time: Mutex<u64>,
}

impl LamportClock {
    pub fn new() -> Self {
        Self { time: Mutex::new(0) }
    }

    /// Internal event: advance the counter and return the new timestamp.
    pub fn increment(&self) -> u64 {
        let mut time = self.time.lock().unwrap();
        *time += 1;
        *time
    }

    /// Message receipt: merge a remote timestamp (max rule) and advance.
    ///
    /// Reserved for inter-orchestrator causal exchange; the current dispatch
    /// path never calls it, but it is part of the clock's contract.
    pub fn update(&self, received_time: u64) -> u64 {
        let mut time = self.time.lock().unwrap();
        *time = (*time).max(received_time) + 1;
        *time
    }

    pub fn get_time(&self) -> u64 {
        *self.time.lock().unwrap()
    }

    /// Overwrite the counter. Only snapshot loading on the backup does this.
    pub fn set_time(&self, new_time: u64) {
        *self.time.lock().unwrap() = new_time;
    }
}

impl Default for LamportClock {
    fn default() -> Self {
        Self::new()
    }
}
