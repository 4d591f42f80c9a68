use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::game::{models::validate_roster, Match, MatchPlayer, Target, MARKS_TO_CLOSE};
use crate::player::Player;
use crate::shared::AppError;

/// Current backup format version
pub const BACKUP_VERSION: u32 = 1;

/// Fields every backup document must carry
const REQUIRED_FIELDS: [&str; 4] = ["version", "players", "matches", "matchPlayers"];

/// Whole-database snapshot used for export and import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    pub version: u32,
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub match_players: Vec<MatchPlayer>,
}

impl Backup {
    pub fn new(players: Vec<Player>, matches: Vec<Match>, match_players: Vec<MatchPlayer>) -> Self {
        Self {
            export_date: Utc::now(),
            version: BACKUP_VERSION,
            players,
            matches,
            match_players,
        }
    }

    /// Parses and validates a backup document
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| AppError::Validation(format!("Invalid backup file format: {}", e)))?;

        let object = value.as_object().ok_or_else(|| {
            AppError::Validation("Invalid backup file format: expected an object".to_string())
        })?;
        if let Some(missing) = REQUIRED_FIELDS
            .iter()
            .find(|field| object.get(**field).map_or(true, |v| v.is_null()))
        {
            return Err(AppError::Validation(format!(
                "Invalid backup file format: missing `{}`",
                missing
            )));
        }

        let backup: Backup = serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Invalid backup file format: {}", e)))?;
        backup.validate()?;
        Ok(backup)
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the data model invariants across the whole snapshot
    pub fn validate(&self) -> Result<(), AppError> {
        if self.version == 0 {
            return Err(AppError::Validation(
                "Invalid backup file format: missing `version`".to_string(),
            ));
        }

        let mut player_ids = HashSet::new();
        for player in &self.players {
            if !player_ids.insert(player.id) {
                return Err(invalid(format!("duplicate player {}", player.id)));
            }
        }

        let mut matches = HashMap::new();
        for record in &self.matches {
            validate_roster(&record.player_ids)
                .map_err(|_| invalid(format!("match {} has an invalid roster", record.id)))?;
            if record.completed
                && !record.winner_id.is_some_and(|winner| record.has_player(winner))
            {
                return Err(invalid(format!(
                    "completed match {} has no valid winner",
                    record.id
                )));
            }
            if matches.insert(record.id, record).is_some() {
                return Err(invalid(format!("duplicate match {}", record.id)));
            }
        }

        let mut seats = HashSet::new();
        let mut record_ids = HashSet::new();
        for mp in &self.match_players {
            let record = matches
                .get(&mp.match_id)
                .ok_or_else(|| invalid(format!("match player {} has no match", mp.id)))?;
            if !record.has_player(mp.player_id) {
                return Err(invalid(format!(
                    "match player {} is not on the roster of match {}",
                    mp.id, mp.match_id
                )));
            }
            if !record_ids.insert(mp.id) || !seats.insert((mp.match_id, mp.player_id)) {
                return Err(invalid(format!("duplicate match player {}", mp.id)));
            }
            if Target::all().any(|target| mp.marks[target] > MARKS_TO_CLOSE) {
                return Err(invalid(format!("match player {} has too many marks", mp.id)));
            }
        }

        Ok(())
    }

    /// Turn position of each scoring record within its match
    pub fn seats(&self) -> HashMap<Uuid, usize> {
        let matches: HashMap<Uuid, &Match> = self.matches.iter().map(|m| (m.id, m)).collect();
        self.match_players
            .iter()
            .filter_map(|mp| {
                let seat = matches.get(&mp.match_id)?.seat_of(mp.player_id)?;
                Some((mp.id, seat))
            })
            .collect()
    }
}

fn invalid(detail: String) -> AppError {
    AppError::Validation(format!("Invalid backup: {}", detail))
}
