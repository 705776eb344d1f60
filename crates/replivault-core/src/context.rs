//! Call context supplied by the execution environment

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a caller or storage node.
///
/// The coordinator never authenticates identities itself; it trusts the
/// execution environment to hand it the identity that authorized the call.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a new principal identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Per-call execution context.
///
/// Carries the caller identity and the current block height, which is the
/// only clock in the system: every created-at/assigned-at/verified-at field
/// is stamped from it. The environment must keep it monotonically
/// non-decreasing across calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Identity that authorized this call
    pub caller: PrincipalId,
    /// Current block/sequence counter
    pub block_height: u64,
}

impl CallContext {
    /// Create a new call context
    pub fn new(caller: impl Into<PrincipalId>, block_height: u64) -> Self {
        Self {
            caller: caller.into(),
            block_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_id_display() {
        let id = PrincipalId::new("node-1");
        assert_eq!(id.to_string(), "node-1");
        assert_eq!(id.as_str(), "node-1");
    }

    #[test]
    fn test_principal_id_serde_transparent() {
        let id = PrincipalId::new("node-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"node-1\"");
        let back: PrincipalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_call_context() {
        let ctx = CallContext::new("alice", 42);
        assert_eq!(ctx.caller, PrincipalId::new("alice"));
        assert_eq!(ctx.block_height, 42);
    }
}
