//! Coordinator configuration

use crate::context::PrincipalId;
use serde::{Deserialize, Serialize};

/// Deployment-time configuration for a [`BackupCoordinator`](crate::BackupCoordinator).
///
/// The owner identity gates the admin operations; it is fixed for the
/// lifetime of the coordinator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Identity allowed to change the replica policy
    pub owner: PrincipalId,
    /// Source node used when a restore request names no preference.
    /// Defaults to the owner when unset.
    pub restore_fallback: Option<PrincipalId>,
    /// Advisory minimum replica count; not enforced against requests
    pub min_replicas: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            owner: PrincipalId::new("owner"),
            restore_fallback: None,
            min_replicas: 2,
        }
    }
}

impl CoordinatorConfig {
    /// Create a new config with the given owner identity
    pub fn new(owner: impl Into<PrincipalId>) -> Self {
        Self {
            owner: owner.into(),
            ..Default::default()
        }
    }

    /// Set the restore fallback node
    pub fn with_restore_fallback(mut self, node: impl Into<PrincipalId>) -> Self {
        self.restore_fallback = Some(node.into());
        self
    }

    /// Set the initial minimum replica policy value
    pub fn with_min_replicas(mut self, min: u32) -> Self {
        self.min_replicas = min;
        self
    }

    /// The identity restores fall back to when no preference is given
    pub fn fallback_identity(&self) -> PrincipalId {
        self.restore_fallback.clone().unwrap_or_else(|| self.owner.clone())
    }
}
