//! Dispatcher sizing and shutdown settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SetupError;
use crate::domain::Criticality;

/// Pool sizes and drain timing for [`super::TaskDispatcher`].
///
/// The critical pool stays small so high-priority throughput is predictable;
/// the non-critical pool is larger for bulk background work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub critical_workers: usize,
    pub non_critical_workers: usize,
    /// How long `disable()` waits for the non-critical pool before abandoning
    /// whatever is still queued.
    pub drain_timeout_ms: u64,
    pub thread_name_prefix: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            critical_workers: 2,
            non_critical_workers: 6,
            drain_timeout_ms: 1_000,
            thread_name_prefix: "meridian".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn workers(&self, criticality: Criticality) -> usize {
        match criticality {
            Criticality::Critical => self.critical_workers,
            Criticality::NonCritical => self.non_critical_workers,
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        for tier in [Criticality::Critical, Criticality::NonCritical] {
            if self.workers(tier) == 0 {
                return Err(SetupError::EmptyPool(tier));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_sizes() {
        let config = DispatcherConfig::default();
        assert_eq!(config.critical_workers, 2);
        assert_eq!(config.non_critical_workers, 6);
        assert_eq!(config.drain_timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sized_pool_is_rejected() {
        let config = DispatcherConfig {
            non_critical_workers: 0,
            ..DispatcherConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SetupError::EmptyPool(Criticality::NonCritical))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{"critical_workers": 4}"#).unwrap();
        assert_eq!(config.critical_workers, 4);
        assert_eq!(config.non_critical_workers, 6);
    }
}
