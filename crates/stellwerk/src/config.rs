//! Scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Construction options for a [`crate::Scheduler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of tasks allowed in flight at once.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Selects which physical outcome slot a completion settles.
    ///
    /// When `true` (the default), a task settles the slot matching its start
    /// order, which equals its insertion order — so `handles[i]` always
    /// carries task `i`'s outcome. When `false`, a task settles the slot
    /// matching its finish order, so earlier slots settle first regardless
    /// of which task produced the result. The returned handle vector itself
    /// is always laid out in insertion order.
    #[serde(default = "default_ordered")]
    pub ordered: bool,
}

fn default_max_limit() -> usize {
    10
}

fn default_ordered() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
            ordered: default_ordered(),
        }
    }
}

impl SchedulerConfig {
    /// Config with the given concurrency limit and default ordering.
    pub fn with_limit(max_limit: usize) -> Self {
        Self {
            max_limit,
            ..Self::default()
        }
    }

    /// Check the config for invalid values.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.max_limit == 0 {
            return Err(SchedulerError::Configuration(
                "max_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_limit, 10);
        assert!(config.ordered);
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let config: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_limit, 10);
        assert!(config.ordered);

        let config: SchedulerConfig = serde_json::from_str(r#"{"max_limit":3,"ordered":false}"#).unwrap();
        assert_eq!(config.max_limit, 3);
        assert!(!config.ordered);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = SchedulerConfig::with_limit(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_limit"));
    }

    #[test]
    fn test_positive_limit_accepted() {
        assert!(SchedulerConfig::with_limit(1).validate().is_ok());
    }
}
