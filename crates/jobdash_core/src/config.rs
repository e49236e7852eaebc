//! Runtime configuration for the dashboard core.

use crate::logging::default_log_level;
use crate::store::PersistenceConfig;
use std::path::PathBuf;

/// Inputs needed to open a [`Dashboard`](crate::runtime::Dashboard).
///
/// Timing windows and the event log capacity are constants, not settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    /// SQLite state file; `None` keeps state in memory for the process.
    pub state_db_path: Option<PathBuf>,
    pub persistence: PersistenceConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            state_db_path: None,
            persistence: PersistenceConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    pub fn with_state_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_db_path = Some(path.into());
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = persistence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::CoreConfig;
    use crate::store::SliceName;

    #[test]
    fn default_keeps_only_user_durable() {
        let config = CoreConfig::default();
        assert!(config.persistence.is_durable(SliceName::User));
        assert!(!config.persistence.is_durable(SliceName::Jobs));
        assert!(config.log_dir.is_none());
        assert!(config.state_db_path.is_none());
    }
}
