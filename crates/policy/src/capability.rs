use serde::{Deserialize, Serialize};

/// The kind of side effect a tool has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Reads remote state only.
    Read,
    /// Creates, updates or deletes remote resources.
    Write,
    /// Runs the external command-line tool on the local machine.
    Exec,
}

impl Capability {
    /// Whether this capability changes state somewhere.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Capability::Read)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Exec => "exec",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_read_is_non_mutating() {
        assert!(!Capability::Read.is_mutating());
        assert!(Capability::Write.is_mutating());
        assert!(Capability::Exec.is_mutating());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&Capability::Exec).unwrap();
        assert_eq!(json, "\"exec\"");
    }
}
