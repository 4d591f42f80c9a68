pub use models::{Backup, BACKUP_VERSION};
pub use service::{backup_file_name, BackupService};

mod models;
mod service;
