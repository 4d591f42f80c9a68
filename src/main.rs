use cricket_darts::{
    AppConfig, AppError, AppState, Console, CricketRepository, InMemoryRepository,
    SqliteRepository, StorageKind,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = AppConfig::from_env();

    // Logs go to stderr so they stay out of the scoreboard
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(config).await {
        error!(error = %e, "Scorekeeper stopped");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    info!(storage = ?config.storage, "Starting Cricket darts scorekeeper");

    // Easy to switch between implementations:
    let repository: Arc<dyn CricketRepository> = match config.storage {
        StorageKind::Sqlite => Arc::new(SqliteRepository::connect(&config.database_url).await?),
        StorageKind::Memory => Arc::new(InMemoryRepository::new()),
    };
    let state = AppState::new(repository, &config);

    let mut console = Console::new(state, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run().await
}
