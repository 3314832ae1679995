//! Persistence layer for players, game sessions and per-level high scores.

mod achievements;
mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{StoreError, StoreErrorKind};
pub use models::{
    GameSession, HighScore, HighScoreUpdate, NewGameSession, Player, RunOutcome,
};
pub use repository::{DEFAULT_BUSY_TIMEOUT_MS, MIGRATIONS, ScoreStore};
