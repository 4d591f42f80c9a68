use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::targets::Marks;
use crate::shared::AppError;

/// Minimum number of distinct players in a match
pub const MIN_PLAYERS: usize = 2;

/// A single Cricket match; `player_ids` is the fixed turn order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub player_ids: Vec<Uuid>,
    pub winner_id: Option<Uuid>,
    pub completed: bool,
}

impl Match {
    /// Creates an incomplete match after checking the roster
    pub fn new(player_ids: &[Uuid]) -> Result<Self, AppError> {
        validate_roster(player_ids)?;

        Ok(Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            player_ids: player_ids.to_vec(),
            winner_id: None,
            completed: false,
        })
    }

    pub fn has_player(&self, player_id: Uuid) -> bool {
        self.player_ids.contains(&player_id)
    }

    /// Turn position of a player, if they take part in this match
    pub fn seat_of(&self, player_id: Uuid) -> Option<usize> {
        self.player_ids.iter().position(|id| *id == player_id)
    }
}

/// A player's scoring record within one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlayer {
    pub id: Uuid,
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub marks: Marks,
    pub points: u32,
}

impl MatchPlayer {
    /// Fresh record: every target open, no points
    pub fn new(match_id: Uuid, player_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            player_id,
            marks: Marks::new(),
            points: 0,
        }
    }
}

/// Checks that a roster has at least two entries and no duplicates
pub fn validate_roster(player_ids: &[Uuid]) -> Result<(), AppError> {
    if player_ids.len() < MIN_PLAYERS {
        return Err(AppError::Validation(format!(
            "A match needs at least {} players",
            MIN_PLAYERS
        )));
    }

    let mut seen = HashSet::new();
    if !player_ids.iter().all(|id| seen.insert(*id)) {
        return Err(AppError::Validation(
            "Players in a match must be distinct".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_match_keeps_turn_order() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let record = Match::new(&ids).unwrap();

        assert_eq!(record.player_ids, ids);
        assert!(!record.completed);
        assert!(record.winner_id.is_none());
        assert_eq!(record.seat_of(ids[2]), Some(2));
    }

    #[test]
    fn test_new_match_rejects_single_player() {
        let result = Match::new(&[Uuid::new_v4()]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_new_match_rejects_duplicates() {
        let id = Uuid::new_v4();
        let result = Match::new(&[id, id]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_match_player_starts_empty() {
        let record = MatchPlayer::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(record.points, 0);
        assert_eq!(record.marks.total(), 0);
    }
}
