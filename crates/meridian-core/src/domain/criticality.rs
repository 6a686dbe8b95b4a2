//! Criticality tier of deferred work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which worker pool a task belongs to.
///
/// - `Critical`: must be attempted even during shutdown (drained on the
///   disabling thread if still queued).
/// - `NonCritical`: may be abandoned when the bounded shutdown wait expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Critical,
    NonCritical,
}

impl Criticality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::NonCritical => "non-critical",
        }
    }

    pub fn is_critical(self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criticality_serializes_snake_case() {
        let s = serde_json::to_string(&Criticality::NonCritical).unwrap();
        assert_eq!(s, "\"non_critical\"");
        assert_eq!(Criticality::NonCritical.to_string(), "non-critical");
        assert!(Criticality::Critical.is_critical());
    }
}
