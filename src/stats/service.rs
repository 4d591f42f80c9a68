use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::models::PlayerStats;
use crate::{player::Player, shared::AppError, store::CricketRepository};

/// A player paired with their statistics, for the all-players listing
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatsSummary {
    pub player: Player,
    pub stats: PlayerStats,
}

pub struct StatsService {
    repository: Arc<dyn CricketRepository>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn CricketRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn get_player_stats(&self, player_id: Uuid) -> Result<PlayerStats, AppError> {
        if self.repository.get_player(player_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Player {} not found", player_id)));
        }
        self.compute(player_id).await
    }

    /// Statistics for every player, in roster order
    #[instrument(skip(self))]
    pub async fn all_player_stats(&self) -> Result<Vec<PlayerStatsSummary>, AppError> {
        let players = self.repository.list_players().await?;

        let mut summaries = Vec::with_capacity(players.len());
        for player in players {
            let stats = self.compute(player.id).await?;
            summaries.push(PlayerStatsSummary { player, stats });
        }
        Ok(summaries)
    }

    async fn compute(&self, player_id: Uuid) -> Result<PlayerStats, AppError> {
        let matches = self.repository.list_matches_for_player(player_id).await?;
        let records = self
            .repository
            .list_match_players_for_player(player_id)
            .await?;

        let stats = PlayerStats::aggregate(player_id, &matches, &records);
        debug!(
            player_id = %player_id,
            games_played = stats.games_played,
            wins = stats.wins,
            "Player stats computed"
        );
        Ok(stats)
    }
}
