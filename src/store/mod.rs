pub use repository::{CricketRepository, InMemoryRepository};
pub use sqlite::SqliteRepository;

pub mod repository;
pub mod sqlite;
