//! State Store Tests
//!
//! Exercises the queue/table invariants, worker liveness sweeps, completion
//! idempotency and the snapshot round-trip used by replication.

#[cfg(test)]
mod tests {
    use crate::clock::LamportClock;
    use crate::state::store::{StateSnapshot, StateStore};
    use crate::state::types::{Task, TaskStatus};
    use std::net::SocketAddr;
    use std::time::Duration;

    fn store() -> StateStore {
        StateStore::new(Duration::from_secs(60))
    }

    fn task(lamport_ts: u64) -> Task {
        Task::new(
            "user1".to_string(),
            serde_json::json!({"description": "x", "duration": 1}),
            lamport_ts,
        )
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    // ============================================================
    // QUEUE / TABLE CONSISTENCY
    // ============================================================

    #[test]
    fn test_add_task_enqueues_pending() {
        let store = store();
        let t = task(1);
        let id = t.id.clone();

        store.add_task(t);

        assert_eq!(store.pending_ids(), vec![id.clone()]);
        let stored = store.get_task_status(&id).unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
        assert!(stored.assigned_worker.is_none());
    }

    #[test]
    fn test_get_next_task_dequeues_and_marks_in_progress() {
        let store = store();
        let t = task(1);
        let id = t.id.clone();
        store.add_task(t);

        let next = store.get_next_task().expect("queue has one task");

        // The dequeue and the status flip are one atomic step: the returned
        // record and the table entry both already read IN_PROGRESS, and the
        // queue no longer holds the id.
        assert_eq!(next.id, id);
        assert_eq!(next.status, TaskStatus::InProgress);
        assert_eq!(store.get_task_status(&id).unwrap().status, TaskStatus::InProgress);
        assert!(store.pending_ids().is_empty());
    }

    #[test]
    fn test_get_next_task_on_empty_queue() {
        let store = store();
        assert!(store.get_next_task().is_none());
    }

    #[test]
    fn test_fifo_order_for_submissions() {
        let store = store();
        let (a, b, c) = (task(1), task(2), task(3));
        let ids = [a.id.clone(), b.id.clone(), c.id.clone()];
        store.add_task(a);
        store.add_task(b);
        store.add_task(c);

        for expected in &ids {
            assert_eq!(&store.get_next_task().unwrap().id, expected);
        }
    }

    // ============================================================
    // WORKER LIVENESS
    // ============================================================

    #[test]
    fn test_heartbeat_registers_worker() {
        let store = store();

        store.update_worker_heartbeat("localhost_60001", addr(41000));

        let active = store.check_dead_workers();
        assert_eq!(active, vec!["localhost_60001".to_string()]);
        assert_eq!(store.worker_host("localhost_60001").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_dead_worker_is_removed_and_tasks_rescued() {
        // Zero timeout: any registered worker is already expired.
        let store = StateStore::new(Duration::from_secs(0));
        store.update_worker_heartbeat("localhost_60002", addr(41000));

        let t = task(1);
        let id = t.id.clone();
        store.add_task(t);
        let dispatched = store.get_next_task().unwrap();
        store.mark_assigned(&dispatched.id, "localhost_60002");

        std::thread::sleep(Duration::from_millis(20));
        let active = store.check_dead_workers();

        assert!(active.is_empty());
        let rescued = store.get_task_status(&id).unwrap();
        assert_eq!(rescued.status, TaskStatus::Pending);
        assert!(rescued.assigned_worker.is_none());
        assert_eq!(store.pending_ids(), vec![id]);
    }

    #[test]
    fn test_rescued_task_jumps_the_queue() {
        let store = StateStore::new(Duration::from_secs(0));
        store.update_worker_heartbeat("localhost_60002", addr(41000));

        let in_flight = task(1);
        let in_flight_id = in_flight.id.clone();
        store.add_task(in_flight);
        let dispatched = store.get_next_task().unwrap();
        store.mark_assigned(&dispatched.id, "localhost_60002");

        // A younger task is already waiting when the worker dies.
        let waiting = task(2);
        let waiting_id = waiting.id.clone();
        store.add_task(waiting);

        std::thread::sleep(Duration::from_millis(20));
        store.check_dead_workers();

        assert_eq!(store.pending_ids(), vec![in_flight_id, waiting_id]);
    }

    #[test]
    fn test_completed_task_is_not_rescued() {
        let store = StateStore::new(Duration::from_secs(0));
        store.update_worker_heartbeat("localhost_60002", addr(41000));

        let t = task(1);
        let id = t.id.clone();
        store.add_task(t);
        store.get_next_task().unwrap();
        store.mark_assigned(&id, "localhost_60002");
        store.update_task_status(&id, TaskStatus::Completed, Some(serde_json::json!({"ok": true})));

        std::thread::sleep(Duration::from_millis(20));
        store.check_dead_workers();

        assert_eq!(store.get_task_status(&id).unwrap().status, TaskStatus::Completed);
        assert!(store.pending_ids().is_empty());
    }

    // ============================================================
    // COMPLETIONS
    // ============================================================

    #[test]
    fn test_completion_is_idempotent() {
        let store = store();
        let t = task(1);
        let id = t.id.clone();
        store.add_task(t);
        store.get_next_task().unwrap();

        let result = serde_json::json!({"message": "done"});
        store.update_task_status(&id, TaskStatus::Completed, Some(result.clone()));
        let first = store.get_task_status(&id).unwrap();

        // Same datagram delivered again.
        store.update_task_status(&id, TaskStatus::Completed, Some(result));
        let second = store.get_task_status(&id).unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn test_orphan_completion_is_a_silent_noop() {
        let store = store();
        store.update_task_status("no-such-task", TaskStatus::Completed, None);
        assert_eq!(store.counts(), (0, 0, 0));
    }

    // ============================================================
    // SNAPSHOTS
    // ============================================================

    #[test]
    fn test_snapshot_round_trip_reproduces_state() {
        let source = store();
        let pending = task(3);
        let pending_id = pending.id.clone();
        let done = task(7);
        let done_id = done.id.clone();
        source.add_task(done);
        source.add_task(pending);
        source.get_next_task().unwrap();
        source.mark_assigned(&done_id, "localhost_60001");
        source.update_task_status(&done_id, TaskStatus::Completed, Some(serde_json::json!({"message": "ok"})));
        source.update_worker_heartbeat("localhost_60001", addr(41000));

        let bytes = source.get_state_snapshot().unwrap();

        let replica = store();
        let clock = LamportClock::new();
        replica.load_state_snapshot(&bytes, &clock).unwrap();

        assert_eq!(replica.counts(), source.counts());
        assert_eq!(replica.pending_ids(), vec![pending_id]);
        let replicated = replica.get_task_status(&done_id).unwrap();
        assert_eq!(replicated.status, TaskStatus::Completed);
        assert_eq!(replicated.assigned_worker.as_deref(), Some("localhost_60001"));
        assert_eq!(clock.get_time(), 7, "clock follows the highest lamport_ts");
        assert_eq!(replica.worker_host("localhost_60001").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_snapshot_of_empty_state_resets_clock() {
        let bytes = store().get_state_snapshot().unwrap();

        let replica = store();
        let clock = LamportClock::new();
        clock.set_time(99);
        replica.load_state_snapshot(&bytes, &clock).unwrap();

        assert_eq!(clock.get_time(), 0);
    }

    #[test]
    fn test_malformed_snapshot_leaves_state_untouched() {
        let store = store();
        let t = task(5);
        let id = t.id.clone();
        store.add_task(t);

        let clock = LamportClock::new();
        clock.set_time(5);

        assert!(store.load_state_snapshot(b"not json", &clock).is_err());
        assert!(store
            .load_state_snapshot(br#"{"tasks": {}}"#, &clock)
            .is_err(), "incomplete snapshots are rejected");

        assert_eq!(store.pending_ids(), vec![id]);
        assert_eq!(clock.get_time(), 5);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let store = store();
        store.add_task(task(1));
        store.update_worker_heartbeat("localhost_60001", addr(41000));

        let bytes = store.get_state_snapshot().unwrap();
        let decoded: StateSnapshot = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.pending_tasks.len(), 1);
        assert_eq!(decoded.workers.len(), 1);

        // Self-describing JSON with the agreed top-level keys.
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value.get("tasks").is_some());
        assert!(value.get("pending_tasks").is_some());
        assert!(value.get("workers").is_some());
    }
}
