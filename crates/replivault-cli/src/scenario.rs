//! Scenario file format
//!
//! A scenario is a JSON document describing a coordinator deployment and an
//! ordered list of operations to play against it, each with the caller
//! identity that authorizes it. Steps may assert that the ledger rejects
//! them via `"expect": "error"`.

use serde::Deserialize;

/// A full scenario: deployment settings plus the steps to execute
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    /// Owner identity for the coordinator (default "owner")
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Restore fallback node; the owner when unset
    #[serde(default)]
    pub restore_fallback: Option<String>,
    /// Initial advisory minimum-replica policy value
    #[serde(default = "default_min_replicas")]
    pub min_replicas: u32,
    /// Operations to execute, in order
    pub steps: Vec<Step>,
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_min_replicas() -> u32 {
    2
}

/// One operation, executed as one atomic ledger call
#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    /// Identity that authorizes this call
    pub caller: String,
    /// Whether the step is expected to succeed or be rejected
    #[serde(default)]
    pub expect: Expectation,
    #[serde(flatten)]
    pub op: Operation,
}

/// Expected outcome of a step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expectation {
    #[default]
    Ok,
    Error,
}

/// The operation a step performs, tagged by `op`
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    RegisterNode {
        capacity: u64,
    },
    SetNodeActive {
        active: bool,
    },
    CreateBackupRequest {
        file_hash: String,
        file_size: u64,
        priority: u8,
        required_replicas: u32,
        #[serde(default)]
        reward: u64,
    },
    AssignBackup {
        backup_id: u64,
        node: String,
    },
    ReportCompletion {
        backup_id: u64,
        backup_hash: String,
    },
    ReportFailure {
        backup_id: u64,
    },
    VerifyIntegrity {
        file_hash: String,
        verified: bool,
    },
    CreateRestoreRequest {
        file_hash: String,
        #[serde(default)]
        preferred_node: Option<String>,
        #[serde(default)]
        reward: u64,
    },
    CompleteRestore {
        restore_id: u64,
    },
    SetMinReplicas {
        min: u32,
    },
}

impl Operation {
    /// Short name for logs and summaries
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterNode { .. } => "register-node",
            Self::SetNodeActive { .. } => "set-node-active",
            Self::CreateBackupRequest { .. } => "create-backup-request",
            Self::AssignBackup { .. } => "assign-backup",
            Self::ReportCompletion { .. } => "report-completion",
            Self::ReportFailure { .. } => "report-failure",
            Self::VerifyIntegrity { .. } => "verify-integrity",
            Self::CreateRestoreRequest { .. } => "create-restore-request",
            Self::CompleteRestore { .. } => "complete-restore",
            Self::SetMinReplicas { .. } => "set-min-replicas",
        }
    }
}
