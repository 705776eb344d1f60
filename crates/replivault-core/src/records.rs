//! Ledger record types and status machines

use crate::context::PrincipalId;
use serde::{Deserialize, Serialize};

/// Maximum length of a file content hash or backup hash, in bytes
pub const MAX_HASH_LEN: usize = 64;

/// Lifecycle of a backup request.
///
/// Forward-only. In current logic a request only ever advances to
/// `InProgress` (on its first assignment) and stays there; overall
/// completion is observed through its assignments, not on the request
/// record itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl RequestStatus {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Transition table: pending → in-progress → completed | failed
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Failed)
        )
    }
}

/// Lifecycle of one node's copy for one backup request.
///
/// `BackingUp` is a defined intermediate state that no current operation
/// produces; nodes report straight from `Assigned` to an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    Assigned,
    BackingUp,
    Completed,
    Failed,
}

impl AssignmentStatus {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::BackingUp => "backing-up",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Transition table: assigned → backing-up → completed | failed
    /// (outcomes may also be reported directly from assigned)
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Assigned, Self::BackingUp)
                | (Self::Assigned, Self::Completed)
                | (Self::Assigned, Self::Failed)
                | (Self::BackingUp, Self::Completed)
                | (Self::BackingUp, Self::Failed)
        )
    }
}

/// Lifecycle of a restore request.
///
/// `InProgress` and `Failed` are defined but unreached: the only transition
/// current logic performs is pending → completed, and no restore-failure
/// operation exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestoreStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl RestoreStatus {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Transition table: pending → in-progress → completed | failed
    /// (completion may also be reported directly from pending)
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Completed)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Failed)
        )
    }
}

/// A registered storage node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Reputation score, reserved for future quality scoring
    pub reputation: u32,
    /// Total backups ever assigned and reported by this node
    pub total_backups: u64,
    /// Backups reported completed
    pub successful_backups: u64,
    /// Backups reported failed
    pub failed_backups: u64,
    /// Whether the node currently accepts assignments
    pub active: bool,
    /// Offered storage capacity
    pub capacity: u64,
    /// Capacity consumed by completed backups
    pub used: u64,
    /// Block height at registration
    pub registered_at: u64,
}

impl NodeRecord {
    /// Reputation every node starts with
    pub const INITIAL_REPUTATION: u32 = 100;

    /// Create a fresh node record
    pub fn new(capacity: u64, registered_at: u64) -> Self {
        Self {
            reputation: Self::INITIAL_REPUTATION,
            total_backups: 0,
            successful_backups: 0,
            failed_backups: 0,
            active: true,
            capacity,
            used: 0,
            registered_at,
        }
    }

    /// Remaining unconsumed capacity
    pub fn free_capacity(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }
}

/// A durable record of intent to replicate one file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRequest {
    /// Content hash of the file to replicate
    pub file_hash: String,
    /// File size in storage units
    pub file_size: u64,
    /// Identity that requested the backup
    pub requester: PrincipalId,
    /// Priority, 1 (lowest) to 3 (highest)
    pub priority: u8,
    /// Block height at creation
    pub created_at: u64,
    /// Current lifecycle status
    pub status: RequestStatus,
    /// Target replica count, at least 1
    pub required_replicas: u32,
    /// Reward offered for the backup
    pub reward: u64,
}

impl BackupRequest {
    /// Create a new pending request
    pub fn new(
        file_hash: String,
        file_size: u64,
        requester: PrincipalId,
        priority: u8,
        required_replicas: u32,
        reward: u64,
        created_at: u64,
    ) -> Self {
        Self {
            file_hash,
            file_size,
            requester,
            priority,
            created_at,
            status: RequestStatus::Pending,
            required_replicas,
            reward,
        }
    }
}

/// One node's commitment to hold one copy for one backup request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Block height at assignment
    pub assigned_at: u64,
    /// Current lifecycle status
    pub status: AssignmentStatus,
    /// Hash of the stored copy, set only on completion
    pub backup_hash: Option<String>,
    /// Block height of the completion report, set only on completion
    pub completed_at: Option<u64>,
}

impl Assignment {
    /// Create a fresh assignment
    pub fn new(assigned_at: u64) -> Self {
        Self {
            assigned_at,
            status: AssignmentStatus::Assigned,
            backup_hash: None,
            completed_at: None,
        }
    }
}

/// Authoritative record of a verified copy at one node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBackupLocation {
    /// Backup request this copy fulfills
    pub backup_id: u64,
    /// Hash of the stored copy
    pub backup_hash: String,
    /// Block height when the copy was recorded
    pub stored_at: u64,
    /// Block height of the most recent integrity check
    pub last_verified: u64,
    /// Whether the most recent integrity check passed
    pub verified: bool,
}

/// A durable record of intent to retrieve one file from one node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRequest {
    /// Content hash of the file to retrieve
    pub file_hash: String,
    /// Identity that requested the restore
    pub requester: PrincipalId,
    /// Node selected to serve the restore
    pub source_node: PrincipalId,
    /// Block height at creation
    pub created_at: u64,
    /// Current lifecycle status
    pub status: RestoreStatus,
    /// Reward offered for the restore
    pub reward: u64,
}
