// Library crate for the Cricket darts scorekeeper
// This file exposes the public API for integration tests

pub mod backup;
pub mod config;
pub mod console;
pub mod game;
pub mod player;
pub mod shared;
pub mod stats;
pub mod store;

// Re-export commonly used types for easier access in tests
pub use backup::{Backup, BackupService};
pub use config::{AppConfig, StorageKind};
pub use console::Console;
pub use game::{
    GameError, Marks, Match, MatchPlayer, MatchService, MatchSession, Multiplier, Target,
};
pub use player::{Player, PlayerService};
pub use shared::{AppError, AppState};
pub use stats::{PlayerStats, StatsService};
pub use store::{CricketRepository, InMemoryRepository, SqliteRepository};
