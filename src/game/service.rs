use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    game::{
        core::{GameError, MatchSession, Transition},
        models::{validate_roster, Match, MatchPlayer},
        targets::{Multiplier, Target},
    },
    shared::AppError,
    store::CricketRepository,
};

/// Label used when a match references a player that has since been deleted
const MISSING_PLAYER_NAME: &str = "(deleted player)";

/// One line of match history
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub record: Match,
    pub player_names: Vec<String>,
    pub winner_name: Option<String>,
}

/// A match with every participant's final (or current) scores
#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    pub record: Match,
    pub players: Vec<MatchPlayerDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchPlayerDetail {
    pub name: String,
    pub is_winner: bool,
    pub scores: MatchPlayer,
}

pub struct MatchService {
    repository: Arc<dyn CricketRepository>,
}

impl MatchService {
    pub fn new(repository: Arc<dyn CricketRepository>) -> Self {
        Self { repository }
    }

    /// Create a new match for the given players (in turn order) and open a session on it
    #[instrument(skip(self))]
    pub async fn start_match(&self, player_ids: &[Uuid]) -> Result<MatchSession, AppError> {
        validate_roster(player_ids)?;

        for player_id in player_ids {
            if self.repository.get_player(*player_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Player {} not found", player_id)));
            }
        }

        let match_id = self.repository.create_match(player_ids).await?;
        let players = self.repository.get_match_players(match_id).await?;

        info!(match_id = %match_id, players = players.len(), "Match started");
        Ok(MatchSession::new(match_id, players)?)
    }

    /// Open a fresh session on an incomplete match; turn state and undo history start over
    #[instrument(skip(self))]
    pub async fn resume_match(&self, match_id: Uuid) -> Result<MatchSession, AppError> {
        let record = self.find_match(match_id).await?;
        if record.completed {
            return Err(GameError::MatchOver.into());
        }

        let players = self.repository.get_match_players(match_id).await?;
        info!(match_id = %match_id, "Match resumed");
        Ok(MatchSession::new(match_id, players)?)
    }

    /// Score a hit for the active player.
    ///
    /// The returned transition is only handed back once the store has accepted
    /// it; on error the caller should keep using `session` unchanged.
    #[instrument(skip(self, session), fields(match_id = %session.match_id()))]
    pub async fn record_hit(
        &self,
        session: &MatchSession,
        target: Target,
        multiplier: Multiplier,
    ) -> Result<Transition, AppError> {
        let transition = session.record_hit(target, multiplier)?;
        self.commit(session, transition).await
    }

    /// Score a hit attributed to a particular scoring record
    #[instrument(skip(self, session), fields(match_id = %session.match_id()))]
    pub async fn record_hit_for(
        &self,
        session: &MatchSession,
        match_player_id: Uuid,
        target: Target,
        multiplier: Multiplier,
    ) -> Result<Transition, AppError> {
        let transition = session.record_hit_for(match_player_id, target, multiplier)?;
        self.commit(session, transition).await
    }

    #[instrument(skip(self, session), fields(match_id = %session.match_id()))]
    pub async fn record_miss(&self, session: &MatchSession) -> Result<Transition, AppError> {
        let transition = session.record_miss()?;
        self.commit(session, transition).await
    }

    #[instrument(skip(self, session), fields(match_id = %session.match_id()))]
    pub async fn undo(&self, session: &MatchSession) -> Result<Transition, AppError> {
        let transition = session.undo()?;
        self.commit(session, transition).await
    }

    /// Abandon the session; the match stays incomplete and can be resumed later
    #[instrument(skip(self, session), fields(match_id = %session.match_id()))]
    pub async fn end_game(&self, session: MatchSession) -> Result<(), AppError> {
        let match_id = session.end()?;
        info!(match_id = %match_id, "Match left incomplete");
        Ok(())
    }

    /// Match history, newest first
    #[instrument(skip(self))]
    pub async fn list_matches(&self) -> Result<Vec<MatchSummary>, AppError> {
        let matches = self.repository.list_matches().await?;

        let mut summaries = Vec::with_capacity(matches.len());
        for record in matches {
            let mut player_names = Vec::with_capacity(record.player_ids.len());
            for player_id in &record.player_ids {
                player_names.push(self.player_name(*player_id).await?);
            }

            let winner_name = match record.winner_id {
                Some(winner_id) if record.completed => Some(self.player_name(winner_id).await?),
                _ => None,
            };

            summaries.push(MatchSummary {
                record,
                player_names,
                winner_name,
            });
        }

        Ok(summaries)
    }

    #[instrument(skip(self))]
    pub async fn match_detail(&self, match_id: Uuid) -> Result<MatchDetail, AppError> {
        let record = self.find_match(match_id).await?;
        let match_players = self.repository.get_match_players(match_id).await?;

        let mut players = Vec::with_capacity(match_players.len());
        for scores in match_players {
            players.push(MatchPlayerDetail {
                name: self.player_name(scores.player_id).await?,
                is_winner: record.winner_id == Some(scores.player_id),
                scores,
            });
        }

        Ok(MatchDetail { record, players })
    }

    #[instrument(skip(self))]
    pub async fn delete_match(&self, match_id: Uuid) -> Result<(), AppError> {
        self.repository.delete_match(match_id).await?;
        info!(match_id = %match_id, "Match deleted");
        Ok(())
    }

    /// Persist what a transition changed, then hand it back for the caller to adopt
    async fn commit(
        &self,
        previous: &MatchSession,
        transition: Transition,
    ) -> Result<Transition, AppError> {
        if let Some(record) = &transition.changed {
            self.repository
                .update_match_player(record.id, &record.marks, record.points)
                .await
                .map_err(|e| {
                    warn!(error = %e, match_player_id = %record.id, "Failed to persist scores");
                    e
                })?;
        }

        if let Some(winner_id) = transition.winner() {
            if let Err(e) = self
                .repository
                .complete_match(previous.match_id(), winner_id)
                .await
            {
                warn!(error = %e, "Failed to record match completion, restoring pre-hit scores");
                self.restore(previous, &transition).await;
                return Err(e);
            }
            info!(match_id = %previous.match_id(), winner_id = %winner_id, "Match won");
        }

        debug!(events = ?transition.events, "Transition committed");
        Ok(transition)
    }

    /// Best-effort rewrite of the scoring record as it was before `transition`
    async fn restore(&self, previous: &MatchSession, transition: &Transition) {
        let Some(changed) = &transition.changed else {
            return;
        };
        let Some(original) = previous.players().iter().find(|p| p.id == changed.id) else {
            return;
        };

        if let Err(e) = self
            .repository
            .update_match_player(original.id, &original.marks, original.points)
            .await
        {
            warn!(error = %e, match_player_id = %original.id, "Failed to restore pre-hit scores");
        }
    }

    async fn find_match(&self, match_id: Uuid) -> Result<Match, AppError> {
        self.repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
    }

    async fn player_name(&self, player_id: Uuid) -> Result<String, AppError> {
        Ok(self
            .repository
            .get_player(player_id)
            .await?
            .map(|player| player.name)
            .unwrap_or_else(|| MISSING_PLAYER_NAME.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use crate::shared::test_utils::FlakyRepository;
    use crate::store::InMemoryRepository;

    async fn seed_players(repository: &dyn CricketRepository, names: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for name in names {
            let player = Player::new(name).unwrap();
            repository.create_player(&player).await.unwrap();
            ids.push(player.id);
        }
        ids
    }

    /// Leaves the first player one triple-bull away from winning, back on their first dart
    async fn nearly_won(service: &MatchService, session: MatchSession) -> MatchSession {
        let mut session = session;
        for target in Target::all().filter(|t| *t != Target::Bull) {
            session = service
                .record_hit(&session, target, Multiplier::Triple)
                .await
                .unwrap()
                .session;
            for _ in 0..5 {
                session = service.record_miss(&session).await.unwrap().session;
            }
        }
        session
    }

    #[tokio::test]
    async fn test_start_match_creates_records() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());

        let session = service.start_match(&ids).await.unwrap();

        assert_eq!(session.players().len(), 2);
        assert_eq!(session.players()[0].player_id, ids[0]);
        assert_eq!(session.players()[1].player_id, ids[1]);
        let stored = repository.get_match(session.match_id()).await.unwrap().unwrap();
        assert_eq!(stored.player_ids, ids);
    }

    #[tokio::test]
    async fn test_start_match_rejects_single_player() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice"]).await;
        let service = MatchService::new(repository.clone());

        let result = service.start_match(&ids).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repository.list_matches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_match_rejects_unknown_player() {
        let repository = Arc::new(InMemoryRepository::new());
        let mut ids = seed_players(repository.as_ref(), &["Alice"]).await;
        ids.push(Uuid::new_v4());
        let service = MatchService::new(repository.clone());

        let result = service.start_match(&ids).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_hit_is_persisted() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();

        let session = service
            .record_hit(&session, Target::Twenty, Multiplier::Triple)
            .await
            .unwrap()
            .session;
        let session = service
            .record_hit(&session, Target::Twenty, Multiplier::Single)
            .await
            .unwrap()
            .session;

        let stored = repository
            .get_match_players(session.match_id())
            .await
            .unwrap();
        assert_eq!(stored[0].marks[Target::Twenty], 3);
        assert_eq!(stored[0].points, 20);
        assert_eq!(stored[1].points, 0);
    }

    #[tokio::test]
    async fn test_undo_is_persisted() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();

        let hit = service
            .record_hit(&session, Target::Seventeen, Multiplier::Double)
            .await
            .unwrap()
            .session;
        let undone = service.undo(&hit).await.unwrap().session;

        let stored = repository.get_match_players(undone.match_id()).await.unwrap();
        assert_eq!(stored[0].marks[Target::Seventeen], 0);
        assert_eq!(undone.current_dart(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_session() {
        let repository = Arc::new(FlakyRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();

        repository.fail_updates(true);
        let result = service
            .record_hit(&session, Target::Twenty, Multiplier::Triple)
            .await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
        // The caller still holds the untouched pre-hit session
        assert_eq!(session.players()[0].marks[Target::Twenty], 0);
        assert_eq!(session.current_dart(), 1);
        let stored = repository.get_match_players(session.match_id()).await.unwrap();
        assert_eq!(stored[0].marks[Target::Twenty], 0);
    }

    #[tokio::test]
    async fn test_win_completes_match() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();
        let session = nearly_won(&service, session).await;

        let transition = service
            .record_hit(&session, Target::Bull, Multiplier::Triple)
            .await
            .unwrap();
        assert_eq!(transition.winner(), Some(ids[0]));

        let stored = repository.get_match(session.match_id()).await.unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.winner_id, Some(ids[0]));

        let result = service.resume_match(session.match_id()).await;
        assert!(matches!(result, Err(AppError::Game(GameError::MatchOver))));
    }

    #[tokio::test]
    async fn test_failed_completion_restores_scores() {
        let repository = Arc::new(FlakyRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();
        let session = nearly_won(&service, session).await;

        repository.fail_completion(true);
        let result = service
            .record_hit(&session, Target::Bull, Multiplier::Triple)
            .await;
        assert!(matches!(result, Err(AppError::Persistence(_))));

        let stored = repository.get_match_players(session.match_id()).await.unwrap();
        assert_eq!(stored[0].marks[Target::Bull], 0);
        let record = repository.get_match(session.match_id()).await.unwrap().unwrap();
        assert!(!record.completed);
    }

    #[tokio::test]
    async fn test_end_game_leaves_match_incomplete_and_resumable() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob", "Carol"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();
        let session = service
            .record_hit(&session, Target::Nineteen, Multiplier::Double)
            .await
            .unwrap()
            .session;
        let match_id = session.match_id();

        service.end_game(session).await.unwrap();

        let record = repository.get_match(match_id).await.unwrap().unwrap();
        assert!(!record.completed);

        let resumed = service.resume_match(match_id).await.unwrap();
        assert_eq!(resumed.current_player_index(), 0);
        assert_eq!(resumed.current_dart(), 1);
        assert!(!resumed.undo_available());
        assert_eq!(resumed.players()[0].marks[Target::Nineteen], 2);
    }

    #[tokio::test]
    async fn test_history_lists_names_and_winner() {
        let repository = Arc::new(InMemoryRepository::new());
        let ids = seed_players(repository.as_ref(), &["Alice", "Bob"]).await;
        let service = MatchService::new(repository.clone());
        let session = service.start_match(&ids).await.unwrap();
        let session = nearly_won(&service, session).await;
        service
            .record_hit(&session, Target::Bull, Multiplier::Triple)
            .await
            .unwrap();

        let history = service.list_matches().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].player_names, vec!["Alice", "Bob"]);
        assert_eq!(history[0].winner_name.as_deref(), Some("Alice"));

        let detail = service.match_detail(session.match_id()).await.unwrap();
        assert!(detail.players[0].is_winner);
        assert!(!detail.players[1].is_winner);
        assert!(detail.players[0].scores.marks.all_closed());
    }

    #[tokio::test]
    async fn test_unknown_match_is_not_found() {
        let service = MatchService::new(Arc::new(InMemoryRepository::new()));
        let missing = Uuid::new_v4();

        assert!(matches!(
            service.resume_match(missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.match_detail(missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_match(missing).await,
            Err(AppError::NotFound(_))
        ));
    }
}
