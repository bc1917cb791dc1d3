use std::path::PathBuf;

use directories::BaseDirs;

use crate::db::DbError;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".user-roster";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "users.sqlite";
/// Log folder nested inside the data directory.
const LOG_DIR_NAME: &str = "logs";

/// Where the application keeps its files and how loudly it logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    /// Resolve the data directory inside the user's home.
    pub fn from_home() -> Result<Self, DbError> {
        let base_dirs = BaseDirs::new().ok_or(DbError::HomeDirMissing)?;
        Ok(Self::with_data_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_level: default_log_level().to_string(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_the_data_dir() {
        let config = AppConfig::with_data_dir("/tmp/roster");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/roster/users.sqlite"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/roster/logs"));
        assert_eq!(config.log_level, default_log_level());
    }
}
