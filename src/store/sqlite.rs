use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::types::Json;
use sqlx::{Row, Sqlite, Transaction};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::repository::{check_completion, CricketRepository};
use crate::backup::Backup;
use crate::game::{Marks, Match, MatchPlayer};
use crate::player::Player;
use crate::shared::AppError;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS players (
        id BLOB PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        created_date TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS matches (
        id BLOB PRIMARY KEY NOT NULL,
        date TEXT NOT NULL,
        player_ids TEXT NOT NULL,
        winner_id BLOB,
        completed INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS match_players (
        id BLOB PRIMARY KEY NOT NULL,
        match_id BLOB NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
        player_id BLOB NOT NULL,
        seat INTEGER NOT NULL,
        marks TEXT NOT NULL,
        points INTEGER NOT NULL DEFAULT 0,
        UNIQUE (match_id, player_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_match_players_player ON match_players (player_id)",
];

const MATCH_COLUMNS: &str = "id, date, player_ids, winner_id, completed";
const MATCH_PLAYER_COLUMNS: &str = "id, match_id, player_id, marks, points";

/// SQLite implementation of CricketRepository
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and applies the schema
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // A single connection keeps `sqlite::memory:` databases shared across queries
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                warn!(error = %e, url = %url, "Failed to open database");
                AppError::Persistence(e.to_string())
            })?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        info!(url = %url, "SQLite store ready");
        Ok(repository)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Failed to apply schema");
                    AppError::Persistence(e.to_string())
                })?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to open transaction");
            AppError::Persistence(e.to_string())
        })
    }
}

fn player_from_row(row: &SqliteRow) -> Result<Player, AppError> {
    Ok(Player {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_date: row.try_get("created_date")?,
    })
}

fn match_from_row(row: &SqliteRow) -> Result<Match, AppError> {
    let player_ids: Json<Vec<Uuid>> = row.try_get("player_ids")?;
    Ok(Match {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        player_ids: player_ids.0,
        winner_id: row.try_get("winner_id")?,
        completed: row.try_get("completed")?,
    })
}

fn match_player_from_row(row: &SqliteRow) -> Result<MatchPlayer, AppError> {
    let marks: Json<Marks> = row.try_get("marks")?;
    let points: i64 = row.try_get("points")?;
    Ok(MatchPlayer {
        id: row.try_get("id")?,
        match_id: row.try_get("match_id")?,
        player_id: row.try_get("player_id")?,
        marks: marks.0,
        points: u32::try_from(points)
            .map_err(|_| AppError::Persistence(format!("Stored points out of range: {}", points)))?,
    })
}

async fn insert_player(tx: &mut Transaction<'_, Sqlite>, player: &Player) -> Result<(), AppError> {
    sqlx::query("INSERT INTO players (id, name, created_date) VALUES ($1, $2, $3)")
        .bind(player.id)
        .bind(&player.name)
        .bind(player.created_date)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_match(tx: &mut Transaction<'_, Sqlite>, record: &Match) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO matches (id, date, player_ids, winner_id, completed) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(record.id)
    .bind(record.date)
    .bind(Json(&record.player_ids))
    .bind(record.winner_id)
    .bind(record.completed)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_match_player(
    tx: &mut Transaction<'_, Sqlite>,
    record: &MatchPlayer,
    seat: usize,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO match_players (id, match_id, player_id, seat, marks, points) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(record.id)
    .bind(record.match_id)
    .bind(record.player_id)
    .bind(seat as i64)
    .bind(Json(&record.marks))
    .bind(i64::from(record.points))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn wipe(tx: &mut Transaction<'_, Sqlite>) -> Result<(), AppError> {
    for table in ["match_players", "matches", "players"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl CricketRepository for SqliteRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &Player) -> Result<(), AppError> {
        debug!(player_id = %player.id, name = %player.name, "Creating player in database");

        sqlx::query("INSERT INTO players (id, name, created_date) VALUES ($1, $2, $3)")
            .bind(player.id)
            .bind(&player.name)
            .bind(player.created_date)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player.id, "Failed to create player in database");
                AppError::Persistence(e.to_string())
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, AppError> {
        let row = sqlx::query("SELECT id, name, created_date FROM players WHERE id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn list_players(&self) -> Result<Vec<Player>, AppError> {
        let rows = sqlx::query("SELECT id, name, created_date FROM players ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(player_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn rename_player(&self, player_id: Uuid, name: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE players SET name = $2 WHERE id = $1")
            .bind(player_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player_id, "Failed to rename player");
                AppError::Persistence(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(player_id = %player_id, "Player not found for rename");
            return Err(AppError::NotFound(format!("Player {} not found", player_id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.begin().await?;

        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            warn!(player_id = %player_id, "Player not found for deletion");
            return Err(AppError::NotFound(format!("Player {} not found", player_id)));
        }

        let touched: Vec<Uuid> =
            sqlx::query_scalar("SELECT DISTINCT match_id FROM match_players WHERE player_id = $1")
                .bind(player_id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM match_players WHERE player_id = $1")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;

        let mut matches_removed = 0;
        for match_id in touched {
            let result = sqlx::query(
                "DELETE FROM matches WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM match_players WHERE match_id = $1)",
            )
            .bind(match_id)
            .execute(&mut *tx)
            .await?;
            matches_removed += result.rows_affected();
        }

        tx.commit().await?;
        debug!(player_id = %player_id, matches_removed, "Player deleted from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_match(&self, player_ids: &[Uuid]) -> Result<Uuid, AppError> {
        let record = Match::new(player_ids)?;

        let mut tx = self.begin().await?;
        insert_match(&mut tx, &record).await?;
        for (seat, player_id) in player_ids.iter().enumerate() {
            insert_match_player(&mut tx, &MatchPlayer::new(record.id, *player_id), seat).await?;
        }
        tx.commit().await.map_err(|e| {
            warn!(error = %e, match_id = %record.id, "Failed to create match in database");
            AppError::Persistence(e.to_string())
        })?;

        debug!(match_id = %record.id, "Match created in database");
        Ok(record.id)
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self) -> Result<Vec<Match>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM matches ORDER BY date DESC, rowid DESC",
            MATCH_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(match_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, match_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM match_players WHERE match_id = $1")
            .bind(match_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(match_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            warn!(match_id = %match_id, "Match not found for deletion");
            return Err(AppError::NotFound(format!("Match {} not found", match_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match_players(&self, match_id: Uuid) -> Result<Vec<MatchPlayer>, AppError> {
        if self.get_match(match_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Match {} not found", match_id)));
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM match_players WHERE match_id = $1 ORDER BY seat",
            MATCH_PLAYER_COLUMNS
        ))
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(match_player_from_row).collect()
    }

    #[instrument(skip(self, marks))]
    async fn update_match_player(
        &self,
        match_player_id: Uuid,
        marks: &Marks,
        points: u32,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE match_players SET marks = $2, points = $3 WHERE id = $1")
            .bind(match_player_id)
            .bind(Json(marks))
            .bind(i64::from(points))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, match_player_id = %match_player_id, "Failed to update match player");
                AppError::Persistence(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Match player {} not found",
                match_player_id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn complete_match(&self, match_id: Uuid, winner_id: Uuid) -> Result<(), AppError> {
        let record = self
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;
        check_completion(&record, winner_id)?;

        sqlx::query("UPDATE matches SET winner_id = $2, completed = 1 WHERE id = $1 AND completed = 0")
            .bind(match_id)
            .bind(winner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, match_id = %match_id, "Failed to complete match");
                AppError::Persistence(e.to_string())
            })?;

        debug!(match_id = %match_id, winner_id = %winner_id, "Match completed in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_matches_for_player(&self, player_id: Uuid) -> Result<Vec<Match>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM matches m
             WHERE EXISTS (SELECT 1 FROM json_each(m.player_ids) WHERE json_each.value = $1)
             ORDER BY date DESC, rowid DESC",
            MATCH_COLUMNS
        ))
        .bind(player_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(match_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_match_players_for_player(
        &self,
        player_id: Uuid,
    ) -> Result<Vec<MatchPlayer>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM match_players WHERE player_id = $1",
            MATCH_PLAYER_COLUMNS
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(match_player_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn export_data(&self) -> Result<Backup, AppError> {
        let players = self.list_players().await?;

        let match_rows = sqlx::query(&format!(
            "SELECT {} FROM matches ORDER BY rowid",
            MATCH_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        let matches = match_rows
            .iter()
            .map(match_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let record_rows = sqlx::query(&format!(
            "SELECT {} FROM match_players ORDER BY rowid",
            MATCH_PLAYER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        let match_players = record_rows
            .iter()
            .map(match_player_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Backup::new(players, matches, match_players))
    }

    #[instrument(skip(self, backup))]
    async fn import_data(&self, backup: &Backup) -> Result<(), AppError> {
        backup.validate()?;
        let seats = backup.seats();

        let mut tx = self.begin().await?;
        wipe(&mut tx).await?;
        for player in &backup.players {
            insert_player(&mut tx, player).await?;
        }
        for record in &backup.matches {
            insert_match(&mut tx, record).await?;
        }
        for record in &backup.match_players {
            let seat = seats.get(&record.id).copied().unwrap_or_default();
            insert_match_player(&mut tx, record, seat).await?;
        }
        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to import backup");
            AppError::Persistence(e.to_string())
        })?;

        debug!(
            players = backup.players.len(),
            matches = backup.matches.len(),
            "Backup imported into database"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.begin().await?;
        wipe(&mut tx).await?;
        tx.commit().await?;
        info!("All data cleared from database");
        Ok(())
    }
}
