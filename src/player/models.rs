use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::AppError;

/// A registered darts player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub created_date: DateTime<Utc>,
}

impl Player {
    /// Creates a new player with a generated ID; the name is trimmed and must not be empty
    pub fn new(name: &str) -> Result<Self, AppError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_name(name)?,
            created_date: Utc::now(),
        })
    }
}

/// Trims a display name, rejecting blank ones
pub fn normalize_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Player name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_trims_name() {
        let player = Player::new("  Alice ").unwrap();
        assert_eq!(player.name, "Alice");
        assert!(!player.id.is_nil());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(Player::new("   "), Err(AppError::Validation(_))));
    }
}
