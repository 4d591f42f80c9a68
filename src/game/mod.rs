// Public API
pub use self::core::{
    GameError, MatchSession, PlayerView, SessionView, Transition, TurnState, DARTS_PER_TURN,
};
pub use events::MatchEvent;
pub use models::{Match, MatchPlayer, MIN_PLAYERS};
pub use service::{MatchDetail, MatchPlayerDetail, MatchService, MatchSummary};
pub use targets::{Marks, Multiplier, Target, MARKS_TO_CLOSE};

// Internal modules
mod core;
mod events;
pub mod models;
pub mod scoring;
mod service;
mod targets;
