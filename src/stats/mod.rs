pub mod models;
pub mod service;

pub use models::{MarkBreakdown, PlayerStats};
pub use service::{PlayerStatsSummary, StatsService};
