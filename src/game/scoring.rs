//! Cricket scoring rules.
//!
//! A target must be closed (three marks) before hits on it score, and it only
//! scores while at least one opponent still has it open.

use super::models::MatchPlayer;
use super::targets::{Marks, Multiplier, Target, MARKS_TO_CLOSE};

/// Result of applying one hit to a player's record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub marks: Marks,
    pub points: u32,
    pub points_earned: u32,
    pub excess_marks: u8,
}

/// Scores a single hit for `player` against the rest of the table.
///
/// `opponents` must not include `player` itself.
pub fn score_hit<'a>(
    player: &MatchPlayer,
    opponents: impl IntoIterator<Item = &'a MatchPlayer>,
    target: Target,
    multiplier: Multiplier,
) -> HitOutcome {
    let prior_marks = player.marks[target];
    let raw_marks = prior_marks.saturating_add(multiplier.marks());
    let excess_marks = raw_marks.saturating_sub(MARKS_TO_CLOSE);

    let mut marks = player.marks;
    marks[target] = raw_marks.min(MARKS_TO_CLOSE);

    let closed = prior_marks >= MARKS_TO_CLOSE || raw_marks >= MARKS_TO_CLOSE;
    let points_earned = if closed && any_open(opponents, target) {
        u32::from(excess_marks) * target.value()
    } else {
        0
    };

    HitOutcome {
        marks,
        points: player.points + points_earned,
        points_earned,
        excess_marks,
    }
}

fn any_open<'a>(opponents: impl IntoIterator<Item = &'a MatchPlayer>, target: Target) -> bool {
    opponents
        .into_iter()
        .any(|opponent| !opponent.marks.is_closed(target))
}

/// True when `player` has closed every target and trails nobody on points
pub fn is_winner(player: &MatchPlayer, table: &[MatchPlayer]) -> bool {
    player.marks.all_closed()
        && table
            .iter()
            .filter(|other| other.id != player.id)
            .all(|other| player.points >= other.points)
}
