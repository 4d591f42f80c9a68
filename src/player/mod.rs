pub use models::Player;
pub use service::PlayerService;

mod models;
mod service;
