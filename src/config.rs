use std::path::PathBuf;

/// Which repository implementation backs the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

/// Runtime configuration, read from the environment with local defaults
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageKind,
    pub database_url: String,
    pub backup_dir: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Anything other than "memory" selects sqlite
        let storage = match std::env::var("CRICKET_STORAGE").as_deref() {
            Ok("memory") => StorageKind::Memory,
            _ => StorageKind::Sqlite,
        };

        Self {
            storage,
            database_url: std::env::var("CRICKET_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://cricket_darts.db?mode=rwc".to_string()),
            backup_dir: std::env::var("CRICKET_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            log_filter: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "cricket_darts=info".to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::Memory,
            database_url: "sqlite::memory:".to_string(),
            backup_dir: PathBuf::from("."),
            log_filter: "cricket_darts=info".to_string(),
        }
    }
}
