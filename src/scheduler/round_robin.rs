use std::sync::Mutex;

struct RotationInner {
    workers: Vec<String>,
    cursor: usize,
}

/// Cyclic worker selection over the sorted active set.
pub struct RoundRobinRotation {
    inner: Mutex<RotationInner>,
}

impl RoundRobinRotation {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RotationInner {
                workers: Vec::new(),
                cursor: 0,
            }),
        }
    }

    /// Replaces the rotation with a freshly observed active set. The input
    /// comes from a map scan in arbitrary order; sorting keeps the rotation
    /// stable across refreshes.
    pub fn update_workers(&self, mut workers: Vec<String>) {
        let mut inner = self.inner.lock().unwrap();
        workers.sort();
        inner.workers = workers;
        if inner.cursor >= inner.workers.len() {
            inner.cursor = 0;
        }
    }

    /// Next worker in cyclic order, or `None` while the rotation is empty.
    pub fn get_next_worker(&self) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        if inner.workers.is_empty() {
            return None;
        }
        if inner.cursor >= inner.workers.len() {
            inner.cursor = 0;
        }

        let worker = inner.workers[inner.cursor].clone();
        inner.cursor = (inner.cursor + 1) % inner.workers.len();
        Some(worker)
    }
}

impl Default for RoundRobinRotation {
    fn default() -> Self {
        Self::new()
    }
}
