use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::models::{normalize_name, Player};
use crate::{shared::AppError, store::CricketRepository};

/// Service for managing the player roster
pub struct PlayerService {
    repository: Arc<dyn CricketRepository>,
}

impl PlayerService {
    pub fn new(repository: Arc<dyn CricketRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn add_player(&self, name: &str) -> Result<Player, AppError> {
        let player = Player::new(name)?;
        self.repository.create_player(&player).await?;

        info!(player_id = %player.id, name = %player.name, "Player added");
        Ok(player)
    }

    pub async fn list_players(&self) -> Result<Vec<Player>, AppError> {
        self.repository.list_players().await
    }

    pub async fn get_player(&self, player_id: Uuid) -> Result<Player, AppError> {
        self.repository
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Player {} not found", player_id)))
    }

    #[instrument(skip(self))]
    pub async fn rename_player(&self, player_id: Uuid, name: &str) -> Result<Player, AppError> {
        let name = normalize_name(name)?;
        self.repository.rename_player(player_id, &name).await?;

        info!(player_id = %player_id, name = %name, "Player renamed");
        self.get_player(player_id).await
    }

    /// Removes the player along with their match records and any match left empty
    #[instrument(skip(self))]
    pub async fn delete_player(&self, player_id: Uuid) -> Result<(), AppError> {
        self.repository.delete_player(player_id).await?;
        info!(player_id = %player_id, "Player deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRepository;

    fn service() -> (Arc<InMemoryRepository>, PlayerService) {
        let repository = Arc::new(InMemoryRepository::new());
        (repository.clone(), PlayerService::new(repository))
    }

    #[tokio::test]
    async fn test_add_and_list_players() {
        let (_, service) = service();
        let alice = service.add_player("Alice").await.unwrap();
        let bob = service.add_player(" Bob ").await.unwrap();

        let players = service.list_players().await.unwrap();
        assert_eq!(players, vec![alice, bob]);
        assert_eq!(players[1].name, "Bob");
    }

    #[tokio::test]
    async fn test_add_blank_player_rejected() {
        let (_, service) = service();
        let result = service.add_player("").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(service.list_players().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_player() {
        let (_, service) = service();
        let player = service.add_player("Alice").await.unwrap();

        let renamed = service.rename_player(player.id, "Alicia").await.unwrap();
        assert_eq!(renamed.name, "Alicia");
        assert_eq!(renamed.created_date, player.created_date);
    }

    #[tokio::test]
    async fn test_rename_unknown_player() {
        let (_, service) = service();
        let result = service.rename_player(Uuid::new_v4(), "Nobody").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_player_cascades_to_empty_matches() {
        let (repository, service) = service();
        let alice = service.add_player("Alice").await.unwrap();
        let bob = service.add_player("Bob").await.unwrap();
        let carol = service.add_player("Carol").await.unwrap();

        let shared_match = repository.create_match(&[alice.id, bob.id]).await.unwrap();
        let other_match = repository.create_match(&[bob.id, carol.id]).await.unwrap();

        service.delete_player(alice.id).await.unwrap();

        assert!(matches!(
            service.get_player(alice.id).await,
            Err(AppError::NotFound(_))
        ));
        // Bob's record keeps the shared match alive
        let remaining = repository.get_match_players(shared_match).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].player_id, bob.id);
        assert!(repository.get_match(other_match).await.unwrap().is_some());

        service.delete_player(bob.id).await.unwrap();
        assert!(repository.get_match(shared_match).await.unwrap().is_none());
        assert!(repository.get_match(other_match).await.unwrap().is_some());
    }
}
