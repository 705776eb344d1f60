//! The backup coordinator: five ledgers behind one atomic boundary

use crate::{
    config::CoordinatorConfig,
    context::{CallContext, PrincipalId},
    error::{CoordinatorError, Result},
    records::{
        Assignment, AssignmentStatus, BackupRequest, FileBackupLocation, NodeRecord,
        RequestStatus, RestoreRequest, RestoreStatus, MAX_HASH_LEN,
    },
    selector::{FixedFallback, RestoreSourceSelector},
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// The five keyed ledgers plus counters and policy.
///
/// Guarded as a whole by one lock so every operation's read-check-write
/// sequence is a single critical section; a completion report touches three
/// ledgers and must not interleave with a concurrent assignment's capacity
/// check.
#[derive(Debug, Default)]
struct LedgerState {
    nodes: BTreeMap<PrincipalId, NodeRecord>,
    requests: BTreeMap<u64, BackupRequest>,
    assignments: BTreeMap<(u64, PrincipalId), Assignment>,
    locations: BTreeMap<(String, PrincipalId), FileBackupLocation>,
    restores: BTreeMap<u64, RestoreRequest>,
    next_backup_id: u64,
    next_restore_id: u64,
    min_replicas: u32,
}

/// Point-in-time copy of the full ledger state, for dumps and inspection
#[derive(Clone, Debug, Serialize)]
pub struct CoordinatorSnapshot {
    pub nodes: Vec<(PrincipalId, NodeRecord)>,
    pub requests: Vec<(u64, BackupRequest)>,
    pub assignments: Vec<(u64, PrincipalId, Assignment)>,
    pub locations: Vec<(String, PrincipalId, FileBackupLocation)>,
    pub restores: Vec<(u64, RestoreRequest)>,
    pub next_backup_id: u64,
    pub next_restore_id: u64,
    pub min_replicas: u32,
}

/// Coordinates replicated file backups across registered storage nodes.
///
/// Every public operation takes a [`CallContext`] naming the caller and the
/// current block height, validates before writing, and applies its writes
/// atomically. Share across threads with `Arc`.
pub struct BackupCoordinator {
    config: CoordinatorConfig,
    selector: Box<dyn RestoreSourceSelector>,
    state: RwLock<LedgerState>,
}

impl BackupCoordinator {
    /// Create a coordinator with the fixed-fallback restore selector
    pub fn new(config: CoordinatorConfig) -> Self {
        let fallback = FixedFallback::new(config.fallback_identity());
        Self::with_selector(config, Box::new(fallback))
    }

    /// Create a coordinator with a custom restore source selector
    pub fn with_selector(
        config: CoordinatorConfig,
        selector: Box<dyn RestoreSourceSelector>,
    ) -> Self {
        let state = LedgerState {
            next_backup_id: 1,
            next_restore_id: 1,
            min_replicas: config.min_replicas,
            ..Default::default()
        };
        Self {
            config,
            selector,
            state: RwLock::new(state),
        }
    }

    /// The owner identity this coordinator was deployed with
    pub fn owner(&self) -> &PrincipalId {
        &self.config.owner
    }

    // ==================== Node Registry ====================

    /// Register the caller as a storage node offering `capacity` units.
    ///
    /// One node record per identity, for the lifetime of the system.
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub fn register_node(&self, ctx: &CallContext, capacity: u64) -> Result<()> {
        let mut state = self.state.write();
        if state.nodes.contains_key(&ctx.caller) {
            return Err(CoordinatorError::AlreadyExists(format!(
                "node {}",
                ctx.caller
            )));
        }
        state
            .nodes
            .insert(ctx.caller.clone(), NodeRecord::new(capacity, ctx.block_height));
        debug!(capacity, "node registered");
        Ok(())
    }

    /// Flip the caller's active flag, leaving all other fields untouched
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub fn set_node_active(&self, ctx: &CallContext, active: bool) -> Result<()> {
        let mut state = self.state.write();
        let node = state
            .nodes
            .get_mut(&ctx.caller)
            .ok_or_else(|| CoordinatorError::NotFound(format!("node {}", ctx.caller)))?;
        node.active = active;
        debug!(active, "node active flag updated");
        Ok(())
    }

    // ==================== Backup Request Ledger ====================

    /// Create a backup request for the file identified by `file_hash`.
    ///
    /// Returns the newly allocated request id. Validation precedes id
    /// allocation, so a rejected call leaves the counter untouched. The
    /// minimum-replica policy value is advisory and not checked here.
    #[instrument(skip(self, ctx, file_hash), fields(caller = %ctx.caller))]
    pub fn create_backup_request(
        &self,
        ctx: &CallContext,
        file_hash: impl Into<String>,
        file_size: u64,
        priority: u8,
        required_replicas: u32,
        reward: u64,
    ) -> Result<u64> {
        let file_hash = file_hash.into();
        validate_hash("file hash", &file_hash)?;
        if !(1..=3).contains(&priority) {
            return Err(CoordinatorError::InvalidStatus(format!(
                "priority must be between 1 and 3, got {priority}"
            )));
        }
        if required_replicas < 1 {
            return Err(CoordinatorError::InvalidStatus(
                "required replicas must be at least 1".to_string(),
            ));
        }

        let mut state = self.state.write();
        let backup_id = state.next_backup_id;
        state.next_backup_id += 1;
        state.requests.insert(
            backup_id,
            BackupRequest::new(
                file_hash,
                file_size,
                ctx.caller.clone(),
                priority,
                required_replicas,
                reward,
                ctx.block_height,
            ),
        );
        debug!(backup_id, file_size, required_replicas, "backup request created");
        Ok(backup_id)
    }

    // ==================== Assignment Tracker ====================

    /// Assign `node_id` to hold one copy for `backup_id`.
    ///
    /// The request must still be pending and the node active with enough
    /// free capacity for the file. Capacity is checked here but only
    /// consumed on the completion report; nothing is reserved. One call per
    /// desired replica; there is no fan-out.
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub fn assign_backup(
        &self,
        ctx: &CallContext,
        backup_id: u64,
        node_id: &PrincipalId,
    ) -> Result<()> {
        let mut state = self.state.write();

        let request = state
            .requests
            .get(&backup_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("backup request {backup_id}")))?;
        let node = state
            .nodes
            .get(node_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("node {node_id}")))?;

        if !node.active {
            return Err(CoordinatorError::Unauthorized(format!(
                "node {node_id} is inactive"
            )));
        }
        if request.status != RequestStatus::Pending {
            return Err(CoordinatorError::InvalidStatus(format!(
                "backup request {backup_id} is {}, expected pending",
                request.status.as_str()
            )));
        }
        if node.free_capacity() < request.file_size {
            return Err(CoordinatorError::InsufficientCapacity {
                node: node_id.to_string(),
                free: node.free_capacity(),
                needed: request.file_size,
            });
        }
        debug_assert!(request.status.can_transition_to(RequestStatus::InProgress));

        state
            .assignments
            .insert((backup_id, node_id.clone()), Assignment::new(ctx.block_height));
        if let Some(request) = state.requests.get_mut(&backup_id) {
            request.status = RequestStatus::InProgress;
        }
        debug!(backup_id, node = %node_id, "backup assigned");
        Ok(())
    }

    /// Record that the calling node finished its copy for `backup_id`.
    ///
    /// Advances the assignment to completed, records the copy in the
    /// location index (overwriting any prior entry for the same file and
    /// node), and updates the node's counters and used capacity.
    #[instrument(skip(self, ctx, backup_hash), fields(caller = %ctx.caller))]
    pub fn report_backup_completion(
        &self,
        ctx: &CallContext,
        backup_id: u64,
        backup_hash: impl Into<String>,
    ) -> Result<()> {
        let backup_hash = backup_hash.into();
        validate_hash("backup hash", &backup_hash)?;

        let mut state = self.state.write();
        let key = (backup_id, ctx.caller.clone());

        let assignment = state.assignments.get(&key).ok_or_else(|| {
            CoordinatorError::NotFound(format!(
                "assignment for backup {backup_id} and node {}",
                ctx.caller
            ))
        })?;
        let request = state
            .requests
            .get(&backup_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("backup request {backup_id}")))?;

        if assignment.status != AssignmentStatus::Assigned {
            return Err(CoordinatorError::InvalidStatus(format!(
                "assignment for backup {backup_id} is {}, expected assigned",
                assignment.status.as_str()
            )));
        }
        debug_assert!(assignment
            .status
            .can_transition_to(AssignmentStatus::Completed));

        let file_hash = request.file_hash.clone();
        let file_size = request.file_size;

        if let Some(assignment) = state.assignments.get_mut(&key) {
            assignment.status = AssignmentStatus::Completed;
            assignment.backup_hash = Some(backup_hash.clone());
            assignment.completed_at = Some(ctx.block_height);
        }
        state.locations.insert(
            (file_hash, ctx.caller.clone()),
            FileBackupLocation {
                backup_id,
                backup_hash,
                stored_at: ctx.block_height,
                last_verified: ctx.block_height,
                verified: true,
            },
        );
        let node = state
            .nodes
            .get_mut(&ctx.caller)
            .ok_or_else(|| CoordinatorError::NotFound(format!("node {}", ctx.caller)))?;
        node.total_backups += 1;
        node.successful_backups += 1;
        node.used += file_size;
        debug!(backup_id, file_size, "backup completion recorded");
        Ok(())
    }

    /// Record that the calling node failed its copy for `backup_id`.
    ///
    /// Failure reports are accepted from any prior assignment state,
    /// including completed. Used capacity is not reclaimed.
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub fn report_backup_failure(&self, ctx: &CallContext, backup_id: u64) -> Result<()> {
        let mut state = self.state.write();
        let key = (backup_id, ctx.caller.clone());

        let assignment = state.assignments.get(&key).ok_or_else(|| {
            CoordinatorError::NotFound(format!(
                "assignment for backup {backup_id} and node {}",
                ctx.caller
            ))
        })?;
        if assignment.status != AssignmentStatus::Assigned {
            warn!(
                backup_id,
                status = assignment.status.as_str(),
                "failure reported over a non-assigned assignment"
            );
        }

        if let Some(assignment) = state.assignments.get_mut(&key) {
            assignment.status = AssignmentStatus::Failed;
        }
        let node = state
            .nodes
            .get_mut(&ctx.caller)
            .ok_or_else(|| CoordinatorError::NotFound(format!("node {}", ctx.caller)))?;
        node.total_backups += 1;
        node.failed_backups += 1;
        debug!(backup_id, "backup failure recorded");
        Ok(())
    }

    // ==================== Backup Location Index ====================

    /// Re-verify (or un-verify) the caller's stored copy of `file_hash`.
    ///
    /// Stamps the last-verified height and sets the verified flag to the
    /// supplied value. The only write path into the verification fields
    /// besides the initial completion report.
    #[instrument(skip(self, ctx, file_hash), fields(caller = %ctx.caller))]
    pub fn verify_integrity(
        &self,
        ctx: &CallContext,
        file_hash: &str,
        verified: bool,
    ) -> Result<()> {
        let mut state = self.state.write();
        let location = state
            .locations
            .get_mut(&(file_hash.to_string(), ctx.caller.clone()))
            .ok_or_else(|| {
                CoordinatorError::NotFound(format!(
                    "backup location for {file_hash} at node {}",
                    ctx.caller
                ))
            })?;
        location.last_verified = ctx.block_height;
        location.verified = verified;
        debug!(verified, "integrity verification recorded");
        Ok(())
    }

    // ==================== Restore Request Ledger ====================

    /// Create a restore request for `file_hash`.
    ///
    /// The source node is the caller's preference when given; otherwise the
    /// configured selector decides (by default a fixed fallback identity).
    /// Returns the newly allocated restore id.
    #[instrument(skip(self, ctx, file_hash), fields(caller = %ctx.caller))]
    pub fn create_restore_request(
        &self,
        ctx: &CallContext,
        file_hash: impl Into<String>,
        preferred_node: Option<PrincipalId>,
        reward: u64,
    ) -> Result<u64> {
        let file_hash = file_hash.into();
        validate_hash("file hash", &file_hash)?;

        let mut state = self.state.write();
        let source_node = match preferred_node {
            Some(node) => node,
            None => {
                let locations: Vec<(PrincipalId, FileBackupLocation)> = state
                    .locations
                    .iter()
                    .filter(|((hash, _), location)| *hash == file_hash && location.verified)
                    .map(|((_, node), location)| (node.clone(), location.clone()))
                    .collect();
                self.selector.select(&file_hash, &locations)
            }
        };

        let restore_id = state.next_restore_id;
        state.next_restore_id += 1;
        state.restores.insert(
            restore_id,
            RestoreRequest {
                file_hash,
                requester: ctx.caller.clone(),
                source_node: source_node.clone(),
                created_at: ctx.block_height,
                status: RestoreStatus::Pending,
                reward,
            },
        );
        debug!(restore_id, source = %source_node, "restore request created");
        Ok(restore_id)
    }

    /// Mark a restore served; only the selected source node may call this
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub fn complete_restore(&self, ctx: &CallContext, restore_id: u64) -> Result<()> {
        let mut state = self.state.write();
        let restore = state
            .restores
            .get_mut(&restore_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("restore request {restore_id}")))?;

        if restore.source_node != ctx.caller {
            return Err(CoordinatorError::Unauthorized(format!(
                "restore {restore_id} is bound to node {}",
                restore.source_node
            )));
        }
        if restore.status != RestoreStatus::Pending {
            return Err(CoordinatorError::InvalidStatus(format!(
                "restore request {restore_id} is {}, expected pending",
                restore.status.as_str()
            )));
        }
        debug_assert!(restore.status.can_transition_to(RestoreStatus::Completed));

        restore.status = RestoreStatus::Completed;
        debug!(restore_id, "restore completed");
        Ok(())
    }

    // ==================== Admin ====================

    /// Update the advisory minimum-replica policy value; owner only
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller))]
    pub fn set_min_replicas(&self, ctx: &CallContext, new_min: u32) -> Result<()> {
        if ctx.caller != self.config.owner {
            return Err(CoordinatorError::Unauthorized(
                "only the owner may change the replica policy".to_string(),
            ));
        }
        let mut state = self.state.write();
        state.min_replicas = new_min;
        debug!(new_min, "minimum replica policy updated");
        Ok(())
    }

    // ==================== Read accessors ====================

    /// Look up a node record by identity
    pub fn node(&self, id: &PrincipalId) -> Option<NodeRecord> {
        self.state.read().nodes.get(id).cloned()
    }

    /// Check whether a node exists and is active
    pub fn is_node_active(&self, id: &PrincipalId) -> bool {
        self.state.read().nodes.get(id).is_some_and(|n| n.active)
    }

    /// Look up a backup request by id
    pub fn backup_request(&self, backup_id: u64) -> Option<BackupRequest> {
        self.state.read().requests.get(&backup_id).cloned()
    }

    /// Look up an assignment by (backup id, node)
    pub fn assignment(&self, backup_id: u64, node_id: &PrincipalId) -> Option<Assignment> {
        self.state
            .read()
            .assignments
            .get(&(backup_id, node_id.clone()))
            .cloned()
    }

    /// Look up a stored-copy record by (file hash, node)
    pub fn backup_location(
        &self,
        file_hash: &str,
        node_id: &PrincipalId,
    ) -> Option<FileBackupLocation> {
        self.state
            .read()
            .locations
            .get(&(file_hash.to_string(), node_id.clone()))
            .cloned()
    }

    /// All known locations for a file hash, in node order
    pub fn locations_for(&self, file_hash: &str) -> Vec<(PrincipalId, FileBackupLocation)> {
        self.state
            .read()
            .locations
            .iter()
            .filter(|((hash, _), _)| hash == file_hash)
            .map(|((_, node), location)| (node.clone(), location.clone()))
            .collect()
    }

    /// Look up a restore request by id
    pub fn restore_request(&self, restore_id: u64) -> Option<RestoreRequest> {
        self.state.read().restores.get(&restore_id).cloned()
    }

    /// The id the next backup request will receive
    pub fn next_backup_id(&self) -> u64 {
        self.state.read().next_backup_id
    }

    /// The id the next restore request will receive
    pub fn next_restore_id(&self) -> u64 {
        self.state.read().next_restore_id
    }

    /// The current advisory minimum-replica policy value
    pub fn min_replicas(&self) -> u32 {
        self.state.read().min_replicas
    }

    /// Copy out the full ledger state
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.state.read();
        CoordinatorSnapshot {
            nodes: state
                .nodes
                .iter()
                .map(|(id, n)| (id.clone(), n.clone()))
                .collect(),
            requests: state
                .requests
                .iter()
                .map(|(id, r)| (*id, r.clone()))
                .collect(),
            assignments: state
                .assignments
                .iter()
                .map(|((id, node), a)| (*id, node.clone(), a.clone()))
                .collect(),
            locations: state
                .locations
                .iter()
                .map(|((hash, node), l)| (hash.clone(), node.clone(), l.clone()))
                .collect(),
            restores: state
                .restores
                .iter()
                .map(|(id, r)| (*id, r.clone()))
                .collect(),
            next_backup_id: state.next_backup_id,
            next_restore_id: state.next_restore_id,
            min_replicas: state.min_replicas,
        }
    }
}

/// Validate a content or backup hash: non-empty, at most 64 bytes
fn validate_hash(what: &str, hash: &str) -> Result<()> {
    if hash.is_empty() {
        return Err(CoordinatorError::InvalidStatus(format!(
            "{what} cannot be empty"
        )));
    }
    if hash.len() > MAX_HASH_LEN {
        return Err(CoordinatorError::InvalidStatus(format!(
            "{what} cannot exceed {MAX_HASH_LEN} bytes"
        )));
    }
    Ok(())
}
