//! Scenario-driver tests
//!
//! Runs whole JSON scenarios through the CLI runner, covering the same
//! ledger paths an operator would exercise from the command line.

use replivault_cli::{run_scenario, RunnerOptions, Scenario};
use replivault_core::{AssignmentStatus, RestoreStatus};

fn parse(json: &str) -> Scenario {
    serde_json::from_str(json).expect("scenario parses")
}

#[test]
fn test_two_node_replication_scenario() {
    let scenario = parse(
        r#"{
            "owner": "coordinator",
            "steps": [
                { "caller": "node-1", "op": "register-node", "capacity": 1000 },
                { "caller": "node-2", "op": "register-node", "capacity": 200 },
                { "caller": "alice", "op": "create-backup-request",
                  "file_hash": "hash123", "file_size": 500, "priority": 2,
                  "required_replicas": 2, "reward": 10 },
                { "caller": "coordinator", "op": "assign-backup", "backup_id": 1, "node": "node-2",
                  "expect": "error" },
                { "caller": "coordinator", "op": "assign-backup", "backup_id": 1, "node": "node-1" },
                { "caller": "node-1", "op": "report-completion",
                  "backup_id": 1, "backup_hash": "copy" },
                { "caller": "node-1", "op": "verify-integrity", "file_hash": "hash123", "verified": false }
            ]
        }"#,
    );

    let report = run_scenario(&scenario, &RunnerOptions::default());
    assert!(report.success(), "outcomes: {:?}", report.outcomes);

    let (_, node, assignment) = &report.snapshot.assignments[0];
    assert_eq!(node.as_str(), "node-1");
    assert_eq!(assignment.status, AssignmentStatus::Completed);

    let (hash, node, location) = &report.snapshot.locations[0];
    assert_eq!(hash, "hash123");
    assert_eq!(node.as_str(), "node-1");
    assert!(!location.verified);
}

#[test]
fn test_restore_fallback_scenario() {
    let scenario = parse(
        r#"{
            "owner": "coordinator",
            "restore_fallback": "archive",
            "steps": [
                { "caller": "alice", "op": "create-restore-request", "file_hash": "hash123" },
                { "caller": "archive", "op": "complete-restore", "restore_id": 1 }
            ]
        }"#,
    );

    let report = run_scenario(&scenario, &RunnerOptions::default());
    assert!(report.success(), "outcomes: {:?}", report.outcomes);

    let (_, restore) = &report.snapshot.restores[0];
    assert_eq!(restore.source_node.as_str(), "archive");
    assert_eq!(restore.status, RestoreStatus::Completed);
}

#[test]
fn test_block_step_controls_timestamps() {
    let scenario = parse(
        r#"{
            "steps": [
                { "caller": "node-1", "op": "register-node", "capacity": 100 }
            ]
        }"#,
    );

    let options = RunnerOptions {
        start_block: 50,
        block_step: 10,
    };
    let report = run_scenario(&scenario, &options);
    assert!(report.success());
    let (_, node) = &report.snapshot.nodes[0];
    assert_eq!(node.registered_at, 50);
}
