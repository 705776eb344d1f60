//! Restore source selection

use crate::context::PrincipalId;
use crate::records::FileBackupLocation;

/// Chooses the source node for a restore when the requester names none.
///
/// The shipped [`FixedFallback`] simply returns one configured identity; a
/// real selection heuristic (reputation- or locality-aware) can be plugged
/// in at coordinator construction without touching the ledger operations.
pub trait RestoreSourceSelector: Send + Sync {
    /// Pick a source node for `file_hash`.
    ///
    /// `locations` holds the verified copies known for that hash, in node
    /// order. It may be empty; a source must still be returned.
    fn select(
        &self,
        file_hash: &str,
        locations: &[(PrincipalId, FileBackupLocation)],
    ) -> PrincipalId;
}

/// Selector that always answers with one fixed identity
#[derive(Clone, Debug)]
pub struct FixedFallback {
    node: PrincipalId,
}

impl FixedFallback {
    /// Create a selector that always picks `node`
    pub fn new(node: impl Into<PrincipalId>) -> Self {
        Self { node: node.into() }
    }
}

impl RestoreSourceSelector for FixedFallback {
    fn select(
        &self,
        _file_hash: &str,
        _locations: &[(PrincipalId, FileBackupLocation)],
    ) -> PrincipalId {
        self.node.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_fallback_ignores_locations() {
        let selector = FixedFallback::new("archive");
        let locations = vec![(
            PrincipalId::new("node-1"),
            FileBackupLocation {
                backup_id: 1,
                backup_hash: "h".to_string(),
                stored_at: 1,
                last_verified: 1,
                verified: true,
            },
        )];
        assert_eq!(selector.select("hash", &locations), PrincipalId::new("archive"));
        assert_eq!(selector.select("hash", &[]), PrincipalId::new("archive"));
    }
}
