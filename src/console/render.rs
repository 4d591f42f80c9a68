//! Plain-text views for the console.

use std::collections::HashMap;
use uuid::Uuid;

use crate::game::{MatchDetail, MatchEvent, MatchSummary, SessionView, Target};
use crate::player::Player;
use crate::stats::{PlayerStats, PlayerStatsSummary};

pub const HELP: &str = "\
Players:  players | add <name> | rename <player> <new name> | remove <player>
Matches:  start <player>, <player>[, ...] | resume <#> | history | detail <#> | delete <#>
Throwing: hit <target> [s|d|t] (or t20, d19, bull) | miss | undo | board | end
Stats:    stats [player]
Data:     export | import <file> | clear
Other:    help | quit
Players can be named or given by their number in `players`; matches by their number in `history`.";

/// Display names keyed by player ID
pub type Names = HashMap<Uuid, String>;

const UNKNOWN: &str = "?";

fn name<'a>(names: &'a Names, player_id: &Uuid) -> &'a str {
    names.get(player_id).map(String::as_str).unwrap_or(UNKNOWN)
}

fn mark_symbol(marks: u8) -> &'static str {
    match marks {
        0 => ".",
        1 => "/",
        2 => "X",
        _ => "O",
    }
}

pub fn players(players: &[Player]) -> String {
    if players.is_empty() {
        return "No players yet. Add one with `add <name>`.".to_string();
    }
    players
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:>3}. {}", i + 1, p.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scoreboard for the active session
pub fn board(view: &SessionView, names: &Names) -> String {
    let width = view
        .players
        .iter()
        .map(|p| name(names, &p.player_id).len())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut lines = Vec::new();
    let header: Vec<String> = Target::all().map(|t| format!("{:>4}", t.to_string())).collect();
    lines.push(format!("  {:width$} {} {:>6}", "", header.join(""), "pts"));

    for (index, player) in view.players.iter().enumerate() {
        let marker = if !view.match_over && index == view.player_index {
            ">"
        } else {
            " "
        };
        let marks: Vec<String> = player
            .marks
            .iter()
            .map(|(_, m)| format!("{:>4}", mark_symbol(m)))
            .collect();
        lines.push(format!(
            "{} {:width$} {} {:>6}",
            marker,
            name(names, &player.player_id),
            marks.join(""),
            player.points
        ));
    }

    match view.winner_id {
        Some(winner) if view.match_over => {
            lines.push(format!("{} wins!", name(names, &winner)));
        }
        _ => {
            let current = &view.players[view.player_index];
            lines.push(format!(
                "{} to throw, dart {} of 3{}",
                name(names, &current.player_id),
                view.dart_number,
                if view.undo_available { " (undo available)" } else { "" }
            ));
        }
    }

    lines.join("\n")
}

/// One line per event produced by a throw or undo
pub fn events(events: &[MatchEvent], view: &SessionView, names: &Names) -> String {
    let seat_name = |match_player_id: &Uuid| {
        view.players
            .iter()
            .find(|p| p.match_player_id == *match_player_id)
            .map(|p| name(names, &p.player_id))
            .unwrap_or(UNKNOWN)
    };

    events
        .iter()
        .map(|event| match event {
            MatchEvent::HitRecorded {
                match_player_id,
                target,
                multiplier,
                points_earned,
            } => {
                let scored = if *points_earned > 0 {
                    format!(" for {} points", points_earned)
                } else {
                    String::new()
                };
                format!(
                    "{} hit {:?} {}{}",
                    seat_name(match_player_id),
                    multiplier,
                    target,
                    scored
                )
            }
            MatchEvent::DartMissed { match_player_id } => {
                format!("{} missed", seat_name(match_player_id))
            }
            MatchEvent::TurnPassed { to_index, .. } => view
                .players
                .get(*to_index)
                .map(|p| format!("Turn passes to {}", name(names, &p.player_id)))
                .unwrap_or_default(),
            MatchEvent::HitUndone {
                match_player_id,
                target,
            } => format!("Undid {}'s hit on {}", seat_name(match_player_id), target),
            MatchEvent::MatchWon { winner_id } => {
                format!("Game over! {} wins", name(names, winner_id))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn history(matches: &[MatchSummary]) -> String {
    if matches.is_empty() {
        return "No matches played yet.".to_string();
    }
    matches
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            let result = match &summary.winner_name {
                Some(winner) => format!("won by {}", winner),
                None => "in progress".to_string(),
            };
            format!(
                "{:>3}. {}  {}  ({})",
                i + 1,
                summary.record.date.format("%Y-%m-%d %H:%M"),
                summary.player_names.join(" vs "),
                result
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn detail(detail: &MatchDetail) -> String {
    let mut lines = vec![format!(
        "Match on {} ({})",
        detail.record.date.format("%Y-%m-%d %H:%M"),
        if detail.record.completed {
            "completed"
        } else {
            "in progress"
        }
    )];

    for player in &detail.players {
        let marks: Vec<String> = player
            .scores
            .marks
            .iter()
            .map(|(target, m)| format!("{}:{}", target, m))
            .collect();
        lines.push(format!(
            "  {}{}  {} pts  [{}]",
            player.name,
            if player.is_winner { " (winner)" } else { "" },
            player.scores.points,
            marks.join(" ")
        ));
    }

    lines.join("\n")
}

pub fn player_stats(player_name: &str, stats: &PlayerStats) -> String {
    let breakdown: Vec<String> = stats
        .mark_breakdown
        .iter()
        .map(|(target, marks)| format!("{}:{}", target, marks))
        .collect();

    [
        player_name.to_string(),
        format!(
            "  Games {}  Wins {}  Losses {}  Win rate {:.1}%",
            stats.games_played, stats.wins, stats.losses, stats.win_percentage
        ),
        format!(
            "  Marks {} ({:.1}/game)  Points {} ({:.1}/game)",
            stats.total_marks,
            stats.average_marks_per_game,
            stats.total_points,
            stats.average_points_per_game
        ),
        format!("  Marks by target: {}", breakdown.join(" ")),
    ]
    .join("\n")
}

pub fn all_stats(summaries: &[PlayerStatsSummary]) -> String {
    if summaries.is_empty() {
        return "No players yet.".to_string();
    }
    summaries
        .iter()
        .map(|s| player_stats(&s.player.name, &s.stats))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{MatchPlayer, MatchSession, Multiplier};

    fn session() -> (MatchSession, Names) {
        let match_id = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let players = vec![
            MatchPlayer::new(match_id, alice),
            MatchPlayer::new(match_id, bob),
        ];
        let names = Names::from([(alice, "Alice".to_string()), (bob, "Bob".to_string())]);
        (MatchSession::new(match_id, players).unwrap(), names)
    }

    #[test]
    fn test_board_marks_active_player() {
        let (session, names) = session();
        let step = session.record_hit(Target::Twenty, Multiplier::Double).unwrap();

        let text = board(&step.session.view(), &names);
        assert!(text.contains("> Alice"));
        assert!(text.contains("Alice to throw, dart 2 of 3 (undo available)"));
    }

    #[test]
    fn test_events_name_the_thrower() {
        let (session, names) = session();
        let step = session.record_hit(Target::Bull, Multiplier::Triple).unwrap();
        let step = step.session.record_hit(Target::Bull, Multiplier::Single).unwrap();

        let text = events(&step.events, &step.session.view(), &names);
        assert_eq!(text, "Alice hit Single bull for 25 points");
    }

    #[test]
    fn test_empty_listings() {
        assert!(players(&[]).contains("No players"));
        assert!(history(&[]).contains("No matches"));
    }
}
