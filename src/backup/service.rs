use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::Backup;
use crate::{shared::AppError, store::CricketRepository};

/// File name for a backup taken on `date`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("cricket-darts-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Export, import and wipe of the whole store
pub struct BackupService {
    repository: Arc<dyn CricketRepository>,
    backup_dir: PathBuf,
}

impl BackupService {
    pub fn new(repository: Arc<dyn CricketRepository>, backup_dir: PathBuf) -> Self {
        Self {
            repository,
            backup_dir,
        }
    }

    pub async fn export_data(&self) -> Result<Backup, AppError> {
        self.repository.export_data().await
    }

    /// Replaces every player and match with the backup contents
    #[instrument(skip(self, backup))]
    pub async fn import_data(&self, backup: &Backup) -> Result<(), AppError> {
        self.repository.import_data(backup).await?;
        info!(
            players = backup.players.len(),
            matches = backup.matches.len(),
            "Backup imported"
        );
        Ok(())
    }

    /// Writes a dated backup file into the backup directory and returns its path
    #[instrument(skip(self))]
    pub async fn export_to_file(&self) -> Result<PathBuf, AppError> {
        let backup = self.export_data().await?;
        let path = self
            .backup_dir
            .join(backup_file_name(Utc::now().date_naive()));

        tokio::fs::create_dir_all(&self.backup_dir).await?;
        tokio::fs::write(&path, backup.to_json()?).await.map_err(|e| {
            warn!(error = %e, path = %path.display(), "Failed to write backup file");
            AppError::from(e)
        })?;

        info!(path = %path.display(), "Backup exported");
        Ok(path)
    }

    /// Reads, validates and imports a backup file
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn import_from_file(&self, path: &Path) -> Result<Backup, AppError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            warn!(error = %e, "Failed to read backup file");
            AppError::from(e)
        })?;

        let backup = Backup::from_json(&json)?;
        self.import_data(&backup).await?;
        Ok(backup)
    }

    /// Deletes every player, match and scoring record
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.repository.clear_all().await?;
        warn!("All data cleared");
        Ok(())
    }
}
