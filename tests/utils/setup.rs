use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use cricket_darts::{
    AppConfig, AppState, CricketRepository, InMemoryRepository, SqliteRepository, StorageKind,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Which store a test runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

pub struct TestSetup {
    pub state: AppState,
    /// Seeded player IDs, in the order they were given to the builder
    pub players: Vec<Uuid>,
    pub backup_dir: PathBuf,
    _backup_dir: TempDir,
}

pub struct TestSetupBuilder {
    backend: Backend,
    players: Vec<String>,
}

impl TestSetupBuilder {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            players: vec![],
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["Alice", "Bob"])
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["Alice", "Bob", "Carol"])
    }

    pub async fn build(self) -> TestSetup {
        let backup_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage: match self.backend {
                Backend::Memory => StorageKind::Memory,
                Backend::Sqlite => StorageKind::Sqlite,
            },
            backup_dir: backup_dir.path().to_path_buf(),
            ..AppConfig::default()
        };

        let repository: Arc<dyn CricketRepository> = match self.backend {
            Backend::Memory => Arc::new(InMemoryRepository::new()),
            Backend::Sqlite => Arc::new(
                SqliteRepository::connect(&config.database_url)
                    .await
                    .unwrap(),
            ),
        };
        let state = AppState::new(repository, &config);

        let mut players = Vec::new();
        for name in &self.players {
            players.push(state.players.add_player(name).await.unwrap().id);
        }

        TestSetup {
            state,
            players,
            backup_dir: backup_dir.path().to_path_buf(),
            _backup_dir: backup_dir,
        }
    }
}
