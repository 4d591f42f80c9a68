use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::targets::{Multiplier, Target};

/// Events that can occur during a match session
///
/// Events represent facts about things that have already happened. The
/// engine returns them from each transition so the caller can log or render
/// without inspecting the session diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A dart landed on a target and was scored
    HitRecorded {
        match_player_id: Uuid,
        target: Target,
        multiplier: Multiplier,
        points_earned: u32,
    },

    /// A dart was thrown without hitting a Cricket target
    DartMissed { match_player_id: Uuid },

    /// The active player's three darts are used up
    TurnPassed { from_index: usize, to_index: usize },

    /// The last hit was reverted
    HitUndone {
        match_player_id: Uuid,
        target: Target,
    },

    /// A player closed everything while leading on points
    MatchWon { winner_id: Uuid },
}
