// A MatchSession is the in-memory state of one match being played: the
// scoring records in turn order, whose dart it is, and the undo history.

// Every operation takes the session by reference and returns a Transition holding
// the next session, so the caller decides when (and whether) to adopt it.

use serde::Serialize;
use uuid::Uuid;

use super::events::MatchEvent;
use super::models::{MatchPlayer, MIN_PLAYERS};
use super::scoring::{is_winner, score_hit};
use super::targets::{Marks, Multiplier, Target};

/// Darts each player throws per turn
pub const DARTS_PER_TURN: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Match is already over")]
    MatchOver,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Not this player's turn")]
    NotPlayersTurn,
    #[error("Invalid multiplier: {0} (expected 1, 2 or 3)")]
    InvalidMultiplier(u8),
    #[error("Unknown target: {0}")]
    UnknownTarget(String),
    #[error("Match player {0} is not part of this session")]
    UnknownMatchPlayer(Uuid),
    #[error("A session needs at least two players")]
    NotEnoughPlayers,
}

/// Where the session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnState {
    AwaitingHit { player_index: usize, dart: u8 },
    MatchWon { winner_id: Uuid },
}

/// Pre-hit snapshot pushed before every scored hit
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub match_player_id: Uuid,
    pub player_index: usize,
    pub dart: u8,
    pub target: Target,
    pub old_marks: Marks,
    pub old_points: u32,
}

/// Staged result of a session operation
#[derive(Debug, Clone)]
pub struct Transition {
    pub session: MatchSession,
    /// Scoring record that must be persisted before the session is adopted
    pub changed: Option<MatchPlayer>,
    pub events: Vec<MatchEvent>,
}

impl Transition {
    pub fn winner(&self) -> Option<Uuid> {
        self.events.iter().find_map(|event| match event {
            MatchEvent::MatchWon { winner_id } => Some(*winner_id),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSession {
    match_id: Uuid,
    players: Vec<MatchPlayer>, // Turn order
    current_player: usize,
    current_dart: u8,
    undo_stack: Vec<UndoEntry>,
    winner_id: Option<Uuid>, // Player id, set once
}

impl MatchSession {
    /// Starts (or resumes) a session at the first player's first dart
    pub fn new(match_id: Uuid, players: Vec<MatchPlayer>) -> Result<Self, GameError> {
        if players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        Ok(Self {
            match_id,
            players,
            current_player: 0,
            current_dart: 1,
            undo_stack: Vec::new(),
            winner_id: None,
        })
    }

    pub fn record_hit(
        &self,
        target: Target,
        multiplier: Multiplier,
    ) -> Result<Transition, GameError> {
        self.ensure_in_progress()?;

        let index = self.current_player;
        let player = &self.players[index];
        let outcome = score_hit(
            player,
            self.players.iter().filter(|other| other.id != player.id),
            target,
            multiplier,
        );

        let mut next = self.clone();
        next.undo_stack.push(UndoEntry {
            match_player_id: player.id,
            player_index: index,
            dart: self.current_dart,
            target,
            old_marks: player.marks,
            old_points: player.points,
        });
        next.players[index].marks = outcome.marks;
        next.players[index].points = outcome.points;

        let updated = next.players[index].clone();
        let mut events = vec![MatchEvent::HitRecorded {
            match_player_id: updated.id,
            target,
            multiplier,
            points_earned: outcome.points_earned,
        }];

        // The winning dart ends the match without advancing the turn
        if is_winner(&updated, &next.players) {
            next.winner_id = Some(updated.player_id);
            events.push(MatchEvent::MatchWon {
                winner_id: updated.player_id,
            });
        } else {
            next.advance_dart(&mut events);
        }

        Ok(Transition {
            session: next,
            changed: Some(updated),
            events,
        })
    }

    /// Records a hit attributed to a specific scoring record; only the active player may score
    pub fn record_hit_for(
        &self,
        match_player_id: Uuid,
        target: Target,
        multiplier: Multiplier,
    ) -> Result<Transition, GameError> {
        self.ensure_in_progress()?;
        if self.current_player().id != match_player_id {
            return Err(GameError::NotPlayersTurn);
        }
        self.record_hit(target, multiplier)
    }

    pub fn record_miss(&self) -> Result<Transition, GameError> {
        self.ensure_in_progress()?;

        let mut next = self.clone();
        let mut events = vec![MatchEvent::DartMissed {
            match_player_id: self.current_player().id,
        }];
        next.advance_dart(&mut events);

        Ok(Transition {
            session: next,
            changed: None,
            events,
        })
    }

    pub fn undo(&self) -> Result<Transition, GameError> {
        self.ensure_in_progress()?;

        let mut next = self.clone();
        let entry = next.undo_stack.pop().ok_or(GameError::NothingToUndo)?;
        let player = next
            .players
            .iter_mut()
            .find(|p| p.id == entry.match_player_id)
            .ok_or(GameError::UnknownMatchPlayer(entry.match_player_id))?;

        player.marks = entry.old_marks;
        player.points = entry.old_points;
        let restored = player.clone();

        next.current_player = entry.player_index;
        next.current_dart = entry.dart;

        Ok(Transition {
            session: next,
            changed: Some(restored),
            events: vec![MatchEvent::HitUndone {
                match_player_id: entry.match_player_id,
                target: entry.target,
            }],
        })
    }

    /// Abandons the session; only allowed while the match is still running
    pub fn end(self) -> Result<Uuid, GameError> {
        self.ensure_in_progress()?;
        Ok(self.match_id)
    }

    fn advance_dart(&mut self, events: &mut Vec<MatchEvent>) {
        self.current_dart += 1;
        if self.current_dart > DARTS_PER_TURN {
            let from_index = self.current_player;
            self.current_dart = 1;
            self.current_player = (self.current_player + 1) % self.players.len();
            events.push(MatchEvent::TurnPassed {
                from_index,
                to_index: self.current_player,
            });
        }
    }

    fn ensure_in_progress(&self) -> Result<(), GameError> {
        if self.winner_id.is_some() {
            return Err(GameError::MatchOver);
        }
        Ok(())
    }

    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    pub fn players(&self) -> &[MatchPlayer] {
        &self.players
    }

    pub fn current_player(&self) -> &MatchPlayer {
        &self.players[self.current_player]
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player
    }

    pub fn current_dart(&self) -> u8 {
        self.current_dart
    }

    pub fn undo_available(&self) -> bool {
        self.winner_id.is_none() && !self.undo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn winner_id(&self) -> Option<Uuid> {
        self.winner_id
    }

    pub fn is_over(&self) -> bool {
        self.winner_id.is_some()
    }

    pub fn state(&self) -> TurnState {
        match self.winner_id {
            Some(winner_id) => TurnState::MatchWon { winner_id },
            None => TurnState::AwaitingHit {
                player_index: self.current_player,
                dart: self.current_dart,
            },
        }
    }

    /// Snapshot for rendering
    pub fn view(&self) -> SessionView {
        SessionView {
            match_id: self.match_id,
            player_index: self.current_player,
            dart_number: self.current_dart,
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    match_player_id: p.id,
                    player_id: p.player_id,
                    marks: p.marks,
                    points: p.points,
                })
                .collect(),
            undo_available: self.undo_available(),
            match_over: self.is_over(),
            winner_id: self.winner_id,
        }
    }
}

/// What the presentation layer needs after every action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub match_id: Uuid,
    pub player_index: usize,
    pub dart_number: u8,
    pub players: Vec<PlayerView>,
    pub undo_available: bool,
    pub match_over: bool,
    pub winner_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub match_player_id: Uuid,
    pub player_id: Uuid,
    pub marks: Marks,
    pub points: u32,
}
