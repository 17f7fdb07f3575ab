//! Policy configuration and enforcement.

use crate::Capability;
use serde::{Deserialize, Serialize};

/// Policy configuration, usually embedded in the server's TOML config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Suppress every tool whose capability is mutating.
    #[serde(default)]
    pub read_only: bool,
}

/// Result of a capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl Policy {
    /// Allow every tool.
    pub fn permissive() -> Self {
        Self { read_only: false }
    }

    /// Allow read tools only.
    pub fn read_only() -> Self {
        Self { read_only: true }
    }

    /// Check whether a tool with the given capability may be registered.
    pub fn check(&self, capability: Capability) -> Decision {
        if self.read_only && capability.is_mutating() {
            return Decision::Deny {
                reason: format!("{capability} tools are disabled in read-only mode"),
            };
        }
        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_denies_write_and_exec() {
        let policy = Policy::read_only();
        assert!(policy.check(Capability::Read).is_allowed());
        assert!(!policy.check(Capability::Write).is_allowed());
        assert!(!policy.check(Capability::Exec).is_allowed());
    }

    #[test]
    fn permissive_allows_everything() {
        let policy = Policy::permissive();
        for capability in [Capability::Read, Capability::Write, Capability::Exec] {
            assert!(policy.check(capability).is_allowed());
        }
    }

    #[test]
    fn default_is_not_read_only() {
        assert_eq!(Policy::default(), Policy::permissive());
    }

    #[test]
    fn deny_reason_names_capability() {
        let Decision::Deny { reason } = Policy::read_only().check(Capability::Write) else {
            panic!("expected deny");
        };
        assert!(reason.contains("write"));
    }

    #[test]
    fn missing_flag_deserializes_as_permissive() {
        let policy: Policy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, Policy::permissive());
        let policy: Policy = serde_json::from_str(r#"{"read_only":true}"#).unwrap();
        assert_eq!(policy, Policy::read_only());
    }
}
