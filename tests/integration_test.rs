//! Integration tests for the replivault coordination ledger
//!
//! These tests exercise full backup and restore cycles through the public
//! API, plus the atomicity guarantees around capacity accounting.

use replivault_core::{
    AssignmentStatus, BackupCoordinator, CallContext, CoordinatorConfig, CoordinatorError,
    PrincipalId, RequestStatus, RestoreStatus,
};
use rstest::rstest;
use std::sync::Arc;

fn coordinator() -> BackupCoordinator {
    BackupCoordinator::new(CoordinatorConfig::new("owner"))
}

fn ctx(caller: &str, height: u64) -> CallContext {
    CallContext::new(caller, height)
}

/// The end-to-end scenario: register → request → assign → complete → locate
#[test]
fn test_full_backup_cycle() {
    let coord = coordinator();
    let node = PrincipalId::new("node-n");

    coord.register_node(&ctx("node-n", 1), 1000).unwrap();

    let backup_id = coord
        .create_backup_request(&ctx("alice", 2), "hash123", 500, 2, 3, 10)
        .unwrap();
    assert_eq!(backup_id, 1);

    coord.assign_backup(&ctx("owner", 3), backup_id, &node).unwrap();
    assert_eq!(
        coord.backup_request(backup_id).unwrap().status,
        RequestStatus::InProgress
    );

    coord
        .report_backup_completion(&ctx("node-n", 4), backup_id, "hash123")
        .unwrap();

    let location = coord.backup_location("hash123", &node).unwrap();
    assert_eq!(location.backup_id, 1);
    assert!(location.verified);

    let record = coord.node(&node).unwrap();
    assert_eq!(record.used, 500);
    assert_eq!(record.successful_backups, 1);
}

/// The restore scenario: only the selected node may complete, exactly once
#[test]
fn test_full_restore_cycle() {
    let coord = coordinator();
    let node = PrincipalId::new("node-n");

    let restore_id = coord
        .create_restore_request(&ctx("alice", 1), "hash123", Some(node.clone()), 5)
        .unwrap();
    assert_eq!(restore_id, 1);
    let restore = coord.restore_request(restore_id).unwrap();
    assert_eq!(restore.source_node, node);
    assert_eq!(restore.status, RestoreStatus::Pending);

    let err = coord.complete_restore(&ctx("other", 2), restore_id).unwrap_err();
    assert!(matches!(err, CoordinatorError::Unauthorized(_)));

    coord.complete_restore(&ctx("node-n", 3), restore_id).unwrap();
    assert_eq!(
        coord.restore_request(restore_id).unwrap().status,
        RestoreStatus::Completed
    );

    let err = coord.complete_restore(&ctx("node-n", 4), restore_id).unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidStatus(_)));
}

/// The admin scenario: the policy value is owner-gated
#[test]
fn test_admin_policy_gate() {
    let coord = coordinator();
    let before = coord.min_replicas();

    let err = coord.set_min_replicas(&ctx("intruder", 1), 9).unwrap_err();
    assert!(matches!(err, CoordinatorError::Unauthorized(_)));
    assert_eq!(coord.min_replicas(), before);

    coord.set_min_replicas(&ctx("owner", 2), 9).unwrap();
    assert_eq!(coord.min_replicas(), 9);
}

/// Boundary priorities are accepted; out-of-range ones are not
#[rstest]
#[case(1, true)]
#[case(3, true)]
#[case(0, false)]
#[case(4, false)]
fn test_priority_bounds(#[case] priority: u8, #[case] accepted: bool) {
    let coord = coordinator();
    let result = coord.create_backup_request(&ctx("alice", 1), "hash", 10, priority, 1, 0);
    assert_eq!(result.is_ok(), accepted);
}

/// Rejected operations leave every ledger unchanged
#[test]
fn test_failed_calls_leave_no_partial_state() {
    let coord = coordinator();
    let node = PrincipalId::new("node-n");
    coord.register_node(&ctx("node-n", 1), 100).unwrap();

    // invalid creation burns no id
    assert!(coord
        .create_backup_request(&ctx("alice", 2), "h", 10, 0, 1, 0)
        .is_err());
    assert_eq!(coord.next_backup_id(), 1);

    // capacity rejection creates no assignment, moves no status
    let id = coord
        .create_backup_request(&ctx("alice", 3), "h", 500, 1, 1, 0)
        .unwrap();
    assert!(coord.assign_backup(&ctx("owner", 4), id, &node).is_err());
    assert!(coord.assignment(id, &node).is_none());
    assert_eq!(coord.backup_request(id).unwrap().status, RequestStatus::Pending);
    let record = coord.node(&node).unwrap();
    assert_eq!(record.total_backups, 0);
    assert_eq!(record.used, 0);
}

/// Replicas across several requests accumulate on one node until full
#[test]
fn test_capacity_accounting_across_requests() {
    let coord = coordinator();
    let node = PrincipalId::new("node-n");
    coord.register_node(&ctx("node-n", 1), 1000).unwrap();

    let first = coord
        .create_backup_request(&ctx("alice", 2), "hash-a", 600, 1, 1, 0)
        .unwrap();
    coord.assign_backup(&ctx("owner", 3), first, &node).unwrap();
    coord
        .report_backup_completion(&ctx("node-n", 4), first, "copy-a")
        .unwrap();

    // 400 free now; a 600-unit request no longer fits
    let second = coord
        .create_backup_request(&ctx("alice", 5), "hash-b", 600, 1, 1, 0)
        .unwrap();
    let err = coord.assign_backup(&ctx("owner", 6), second, &node).unwrap_err();
    assert!(matches!(err, CoordinatorError::InsufficientCapacity { .. }));

    // but a 400-unit one does
    let third = coord
        .create_backup_request(&ctx("alice", 7), "hash-c", 400, 1, 1, 0)
        .unwrap();
    coord.assign_backup(&ctx("owner", 8), third, &node).unwrap();
    coord
        .report_backup_completion(&ctx("node-n", 9), third, "copy-c")
        .unwrap();
    assert_eq!(coord.node(&node).unwrap().free_capacity(), 0);
}

/// Completion overwrites a prior location record for the same file and node
#[test]
fn test_location_overwrite_on_recompletion() {
    let coord = coordinator();
    let node = PrincipalId::new("node-n");
    coord.register_node(&ctx("node-n", 1), 1000).unwrap();

    // two requests for the same file hash, both served by the same node
    for (hash_suffix, height) in [("one", 2u64), ("two", 10u64)] {
        let id = coord
            .create_backup_request(&ctx("alice", height), "samefile", 100, 1, 1, 0)
            .unwrap();
        coord
            .assign_backup(&ctx("owner", height + 1), id, &node)
            .unwrap();
        coord
            .report_backup_completion(
                &ctx("node-n", height + 2),
                id,
                format!("copy-{hash_suffix}"),
            )
            .unwrap();
    }

    let locations = coord.locations_for("samefile");
    assert_eq!(locations.len(), 1);
    let location = coord.backup_location("samefile", &node).unwrap();
    assert_eq!(location.backup_id, 2);
    assert_eq!(location.backup_hash, "copy-two");
    assert_eq!(location.stored_at, 12);
}

/// Racing completion reports for one assignment commit exactly once
#[test]
fn test_concurrent_completions_increment_once() {
    let coord = Arc::new(coordinator());
    let node = PrincipalId::new("node-n");
    coord.register_node(&ctx("node-n", 1), 1000).unwrap();
    let id = coord
        .create_backup_request(&ctx("alice", 2), "hash", 500, 1, 1, 0)
        .unwrap();
    coord.assign_backup(&ctx("owner", 3), id, &node).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let coord = Arc::clone(&coord);
            std::thread::spawn(move || {
                coord.report_backup_completion(&ctx("node-n", 10), id, "copy")
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // one report wins; the rest find the assignment already completed
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1, "results: {results:?}");
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(CoordinatorError::InvalidStatus(_)))));

    let record = coord.node(&node).unwrap();
    assert_eq!(record.total_backups, 1);
    assert_eq!(record.successful_backups, 1);
    assert_eq!(record.used, 500);
    assert_eq!(
        coord.assignment(id, &node).unwrap().status,
        AssignmentStatus::Completed
    );
}

/// Racing registrations for one identity leave exactly one record
#[test]
fn test_concurrent_registrations_keep_one_record() {
    let coord = Arc::new(coordinator());

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let coord = Arc::clone(&coord);
            std::thread::spawn(move || coord.register_node(&ctx("node-n", i), 100 + i))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(coord.node(&PrincipalId::new("node-n")).is_some());
}

/// Capacity is checked at assignment but consumed only at completion; two
/// assignments accepted against the same free space can both commit. This
/// is the ledger's documented behavior, covered so a change is loud.
#[test]
fn test_reservationless_capacity_can_overcommit() {
    let coord = coordinator();
    let node = PrincipalId::new("node-n");
    coord.register_node(&ctx("node-n", 1), 1000).unwrap();

    let first = coord
        .create_backup_request(&ctx("alice", 2), "hash-a", 600, 1, 1, 0)
        .unwrap();
    let second = coord
        .create_backup_request(&ctx("alice", 3), "hash-b", 600, 1, 1, 0)
        .unwrap();

    // nothing is reserved, so both assignments see 1000 free
    coord.assign_backup(&ctx("owner", 4), first, &node).unwrap();
    coord.assign_backup(&ctx("owner", 5), second, &node).unwrap();

    coord
        .report_backup_completion(&ctx("node-n", 6), first, "copy-a")
        .unwrap();
    coord
        .report_backup_completion(&ctx("node-n", 7), second, "copy-b")
        .unwrap();

    let record = coord.node(&node).unwrap();
    assert_eq!(record.used, 1200);
    assert_eq!(record.free_capacity(), 0);
}
