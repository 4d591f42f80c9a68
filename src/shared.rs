use std::sync::Arc;
use thiserror::Error;

use crate::backup::BackupService;
use crate::config::AppConfig;
use crate::game::{GameError, MatchService};
use crate::player::PlayerService;
use crate::stats::StatsService;
use crate::store::CricketRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn CricketRepository>,
    pub players: Arc<PlayerService>,
    pub matches: Arc<MatchService>,
    pub stats: Arc<StatsService>,
    pub backup: Arc<BackupService>,
}

impl AppState {
    pub fn new(repository: Arc<dyn CricketRepository>, config: &AppConfig) -> Self {
        Self {
            players: Arc::new(PlayerService::new(repository.clone())),
            matches: Arc::new(MatchService::new(repository.clone())),
            stats: Arc::new(StatsService::new(repository.clone())),
            backup: Arc::new(BackupService::new(
                repository.clone(),
                config.backup_dir.clone(),
            )),
            repository,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Game(#[from] GameError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}
