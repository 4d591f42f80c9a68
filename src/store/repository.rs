use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::backup::Backup;
use crate::game::{Marks, Match, MatchPlayer};
use crate::player::Player;
use crate::shared::AppError;

/// Trait for the persistence store holding players, matches and per-match scores
#[async_trait]
pub trait CricketRepository: Send + Sync {
    async fn create_player(&self, player: &Player) -> Result<(), AppError>;
    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, AppError>;
    /// All players in creation order
    async fn list_players(&self) -> Result<Vec<Player>, AppError>;
    async fn rename_player(&self, player_id: Uuid, name: &str) -> Result<(), AppError>;
    /// Deletes the player, their match records, and any match left with no records
    async fn delete_player(&self, player_id: Uuid) -> Result<(), AppError>;

    /// Creates the match and one zeroed scoring record per player, returning the match ID
    async fn create_match(&self, player_ids: &[Uuid]) -> Result<Uuid, AppError>;
    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, AppError>;
    /// All matches, newest first
    async fn list_matches(&self) -> Result<Vec<Match>, AppError>;
    async fn delete_match(&self, match_id: Uuid) -> Result<(), AppError>;

    /// Scoring records of a match, in turn order
    async fn get_match_players(&self, match_id: Uuid) -> Result<Vec<MatchPlayer>, AppError>;
    async fn update_match_player(
        &self,
        match_player_id: Uuid,
        marks: &Marks,
        points: u32,
    ) -> Result<(), AppError>;
    async fn complete_match(&self, match_id: Uuid, winner_id: Uuid) -> Result<(), AppError>;

    async fn list_matches_for_player(&self, player_id: Uuid) -> Result<Vec<Match>, AppError>;
    async fn list_match_players_for_player(
        &self,
        player_id: Uuid,
    ) -> Result<Vec<MatchPlayer>, AppError>;

    async fn export_data(&self) -> Result<Backup, AppError>;
    /// Replaces everything with the backup contents; nothing changes if the backup is invalid
    async fn import_data(&self, backup: &Backup) -> Result<(), AppError>;
    async fn clear_all(&self) -> Result<(), AppError>;
}

/// Checks a completion request against the stored match
pub(crate) fn check_completion(record: &Match, winner_id: Uuid) -> Result<(), AppError> {
    if record.completed {
        return Err(AppError::Validation(format!(
            "Match {} is already completed",
            record.id
        )));
    }
    if !record.has_player(winner_id) {
        return Err(AppError::Validation(format!(
            "Player {} did not play in match {}",
            winner_id, record.id
        )));
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
struct Tables {
    players: Vec<Player>,
    matches: Vec<Match>,
    match_players: Vec<MatchPlayer>,
}

impl Tables {
    fn find_match(&self, match_id: Uuid) -> Result<&Match, AppError> {
        self.matches
            .iter()
            .find(|m| m.id == match_id)
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
    }
}

/// In-memory implementation of CricketRepository for development and testing
///
/// Data is stored in memory and will be lost when the application exits.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CricketRepository for InMemoryRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &Player) -> Result<(), AppError> {
        debug!(player_id = %player.id, name = %player.name, "Creating player in memory");

        let mut tables = self.tables.write().await;
        if tables.players.iter().any(|p| p.id == player.id) {
            warn!(player_id = %player.id, "Player already exists in memory");
            return Err(AppError::Persistence("Player already exists".to_string()));
        }
        tables.players.push(player.clone());
        Ok(())
    }

    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.players.iter().find(|p| p.id == player_id).cloned())
    }

    async fn list_players(&self) -> Result<Vec<Player>, AppError> {
        Ok(self.tables.read().await.players.clone())
    }

    #[instrument(skip(self))]
    async fn rename_player(&self, player_id: Uuid, name: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let player = tables
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| AppError::NotFound(format!("Player {} not found", player_id)))?;
        player.name = name.to_string();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.players.iter().any(|p| p.id == player_id) {
            return Err(AppError::NotFound(format!("Player {} not found", player_id)));
        }

        let touched: HashSet<Uuid> = tables
            .match_players
            .iter()
            .filter(|mp| mp.player_id == player_id)
            .map(|mp| mp.match_id)
            .collect();
        tables.match_players.retain(|mp| mp.player_id != player_id);

        let emptied: HashSet<Uuid> = touched
            .into_iter()
            .filter(|match_id| !tables.match_players.iter().any(|mp| mp.match_id == *match_id))
            .collect();
        tables.matches.retain(|m| !emptied.contains(&m.id));
        tables.players.retain(|p| p.id != player_id);

        debug!(
            player_id = %player_id,
            matches_removed = emptied.len(),
            "Player deleted from memory"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_match(&self, player_ids: &[Uuid]) -> Result<Uuid, AppError> {
        let record = Match::new(player_ids)?;
        let match_id = record.id;

        let mut tables = self.tables.write().await;
        for player_id in player_ids {
            tables
                .match_players
                .push(MatchPlayer::new(match_id, *player_id));
        }
        tables.matches.push(record);

        debug!(match_id = %match_id, "Match created in memory");
        Ok(match_id)
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.matches.iter().find(|m| m.id == match_id).cloned())
    }

    async fn list_matches(&self) -> Result<Vec<Match>, AppError> {
        let tables = self.tables.read().await;
        let mut matches: Vec<Match> = tables.matches.iter().rev().cloned().collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, match_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.find_match(match_id)?;

        tables.match_players.retain(|mp| mp.match_id != match_id);
        tables.matches.retain(|m| m.id != match_id);
        Ok(())
    }

    async fn get_match_players(&self, match_id: Uuid) -> Result<Vec<MatchPlayer>, AppError> {
        let tables = self.tables.read().await;
        let record = tables.find_match(match_id)?;

        let mut players: Vec<MatchPlayer> = tables
            .match_players
            .iter()
            .filter(|mp| mp.match_id == match_id)
            .cloned()
            .collect();
        players.sort_by_key(|mp| record.seat_of(mp.player_id).unwrap_or(usize::MAX));
        Ok(players)
    }

    #[instrument(skip(self, marks))]
    async fn update_match_player(
        &self,
        match_player_id: Uuid,
        marks: &Marks,
        points: u32,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .match_players
            .iter_mut()
            .find(|mp| mp.id == match_player_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Match player {} not found", match_player_id))
            })?;

        record.marks = *marks;
        record.points = points;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn complete_match(&self, match_id: Uuid, winner_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;
        check_completion(record, winner_id)?;

        record.winner_id = Some(winner_id);
        record.completed = true;
        debug!(match_id = %match_id, winner_id = %winner_id, "Match completed in memory");
        Ok(())
    }

    async fn list_matches_for_player(&self, player_id: Uuid) -> Result<Vec<Match>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .iter()
            .filter(|m| m.has_player(player_id))
            .cloned()
            .collect())
    }

    async fn list_match_players_for_player(
        &self,
        player_id: Uuid,
    ) -> Result<Vec<MatchPlayer>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .match_players
            .iter()
            .filter(|mp| mp.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn export_data(&self) -> Result<Backup, AppError> {
        let tables = self.tables.read().await;
        Ok(Backup::new(
            tables.players.clone(),
            tables.matches.clone(),
            tables.match_players.clone(),
        ))
    }

    #[instrument(skip(self, backup))]
    async fn import_data(&self, backup: &Backup) -> Result<(), AppError> {
        backup.validate()?;

        let replacement = Tables {
            players: backup.players.clone(),
            matches: backup.matches.clone(),
            match_players: backup.match_players.clone(),
        };
        *self.tables.write().await = replacement;

        debug!(
            players = backup.players.len(),
            matches = backup.matches.len(),
            "Backup imported into memory"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<(), AppError> {
        *self.tables.write().await = Tables::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Target;

    async fn repo_with_players(names: &[&str]) -> (InMemoryRepository, Vec<Uuid>) {
        let repo = InMemoryRepository::new();
        let mut ids = Vec::new();
        for name in names {
            let player = Player::new(name).unwrap();
            repo.create_player(&player).await.unwrap();
            ids.push(player.id);
        }
        (repo, ids)
    }

    #[tokio::test]
    async fn test_create_duplicate_player() {
        let repo = InMemoryRepository::new();
        let player = Player::new("Alice").unwrap();

        repo.create_player(&player).await.unwrap();
        let result = repo.create_player(&player).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_create_match_initializes_records_in_turn_order() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob", "Carol"]).await;
        let order = vec![ids[2], ids[0], ids[1]];

        let match_id = repo.create_match(&order).await.unwrap();
        let players = repo.get_match_players(match_id).await.unwrap();

        let seated: Vec<Uuid> = players.iter().map(|mp| mp.player_id).collect();
        assert_eq!(seated, order);
        assert!(players.iter().all(|mp| mp.points == 0 && mp.marks.total() == 0));
    }

    #[tokio::test]
    async fn test_update_match_player() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob"]).await;
        let match_id = repo.create_match(&ids).await.unwrap();
        let record = repo.get_match_players(match_id).await.unwrap()[0].clone();

        let mut marks = Marks::new();
        marks[Target::Eighteen] = 2;
        repo.update_match_player(record.id, &marks, 36).await.unwrap();

        let stored = repo.get_match_players(match_id).await.unwrap()[0].clone();
        assert_eq!(stored.marks[Target::Eighteen], 2);
        assert_eq!(stored.points, 36);
    }

    #[tokio::test]
    async fn test_update_unknown_match_player() {
        let repo = InMemoryRepository::new();
        let result = repo
            .update_match_player(Uuid::new_v4(), &Marks::new(), 0)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_match_rules() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob", "Carol"]).await;
        let match_id = repo.create_match(&ids[..2]).await.unwrap();

        let outsider = repo.complete_match(match_id, ids[2]).await;
        assert!(matches!(outsider, Err(AppError::Validation(_))));

        let missing = repo.complete_match(Uuid::new_v4(), ids[0]).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        repo.complete_match(match_id, ids[1]).await.unwrap();
        let record = repo.get_match(match_id).await.unwrap().unwrap();
        assert!(record.completed);
        assert_eq!(record.winner_id, Some(ids[1]));

        let again = repo.complete_match(match_id, ids[0]).await;
        assert!(matches!(again, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_matches_newest_first() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob"]).await;
        let first = repo.create_match(&ids).await.unwrap();
        let second = repo.create_match(&ids).await.unwrap();

        let matches = repo.list_matches().await.unwrap();
        let order: Vec<Uuid> = matches.iter().map(|m| m.id).collect();
        assert_eq!(order, vec![second, first]);
    }

    #[tokio::test]
    async fn test_delete_match_removes_records() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob"]).await;
        let match_id = repo.create_match(&ids).await.unwrap();

        repo.delete_match(match_id).await.unwrap();

        assert!(repo.get_match(match_id).await.unwrap().is_none());
        assert!(repo
            .list_match_players_for_player(ids[0])
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            repo.get_match_players(match_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_import_replaces_everything() {
        let (source, ids) = repo_with_players(&["Alice", "Bob"]).await;
        source.create_match(&ids).await.unwrap();
        let backup = source.export_data().await.unwrap();

        let (target, _) = repo_with_players(&["Zed"]).await;
        target.import_data(&backup).await.unwrap();

        let players = target.list_players().await.unwrap();
        assert_eq!(players, backup.players);
        assert_eq!(target.list_matches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_import_leaves_data_untouched() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob"]).await;
        repo.create_match(&ids).await.unwrap();

        let mut backup = repo.export_data().await.unwrap();
        backup.match_players[0].marks[Target::Twenty] = 7;
        backup.players.clear();

        let result = repo.import_data(&backup).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(repo.list_players().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (repo, ids) = repo_with_players(&["Alice", "Bob"]).await;
        repo.create_match(&ids).await.unwrap();

        repo.clear_all().await.unwrap();

        let backup = repo.export_data().await.unwrap();
        assert!(backup.players.is_empty());
        assert!(backup.matches.is_empty());
        assert!(backup.match_players.is_empty());
    }
}
