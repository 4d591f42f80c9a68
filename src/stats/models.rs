use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::game::{Match, MatchPlayer, Target};

/// Lifetime marks per target, in board order
pub type MarkBreakdown = BTreeMap<Target, u32>;

/// Career figures for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player_id: Uuid,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_percentage: f64,
    pub total_marks: u32,
    pub total_points: u32,
    pub average_marks_per_game: f64,
    pub average_points_per_game: f64,
    pub mark_breakdown: MarkBreakdown,
}

impl PlayerStats {
    /// Folds a player's stored records into their statistics.
    ///
    /// Only completed matches count as games played, while marks and points are
    /// summed over every scoring record, finished or not.
    pub fn aggregate(player_id: Uuid, matches: &[Match], records: &[MatchPlayer]) -> Self {
        let (games_played, wins) = matches
            .iter()
            .filter(|m| m.completed && m.has_player(player_id))
            .fold((0u32, 0u32), |(games, wins), m| {
                let won = m.winner_id == Some(player_id);
                (games + 1, wins + u32::from(won))
            });

        let mut mark_breakdown: MarkBreakdown = Target::all().map(|t| (t, 0)).collect();
        let mut total_points = 0;
        for record in records.iter().filter(|mp| mp.player_id == player_id) {
            for (target, marks) in record.marks.iter() {
                *mark_breakdown.entry(target).or_default() += u32::from(marks);
            }
            total_points += record.points;
        }
        let total_marks = mark_breakdown.values().sum();

        Self {
            player_id,
            games_played,
            wins,
            losses: games_played - wins,
            win_percentage: ratio(wins, games_played) * 100.0,
            total_marks,
            total_points,
            average_marks_per_game: ratio(total_marks, games_played),
            average_points_per_game: ratio(total_points, games_played),
            mark_breakdown,
        }
    }
}

fn ratio(numerator: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(games)
    }
}
