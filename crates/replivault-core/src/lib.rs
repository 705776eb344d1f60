//! # Replivault Core
//!
//! Coordination ledger for replicated file backups across a pool of
//! independent storage nodes.
//!
//! This crate provides:
//! - **Node Registry**: capacity, usage, and reputation bookkeeping per node
//! - **Backup Request Ledger**: lifecycle of each replication request
//! - **Assignment Tracker**: per (request, node) commitment and its outcome
//! - **Location Index**: where verified copies of a file live, for restores
//! - **Restore Request Ledger**: retrieval of a file from one source node
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │       Execution environment (caller)        │
//! │    supplies identity + block counter        │
//! ├─────────────────────────────────────────────┤
//! │            BackupCoordinator                │
//! ├──────────┬──────────┬───────────┬───────────┤
//! │  Nodes   │ Requests │Assignments│ Locations │
//! │          │          │           │ Restores  │
//! └──────────┴──────────┴───────────┴───────────┘
//! ```
//!
//! Every public operation is atomic: validation happens before any write,
//! and a failed call leaves all five ledgers untouched.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod records;
pub mod selector;

pub use config::CoordinatorConfig;
pub use context::{CallContext, PrincipalId};
pub use coordinator::{BackupCoordinator, CoordinatorSnapshot};
pub use error::{CoordinatorError, Result};
pub use records::{
    Assignment, AssignmentStatus, BackupRequest, FileBackupLocation, NodeRecord, RequestStatus,
    RestoreRequest, RestoreStatus,
};
pub use selector::{FixedFallback, RestoreSourceSelector};

/// Version of the ledger format
pub const LEDGER_VERSION: &str = "1.0.0";
