//! Scorekeep - score tracking backend for games
//!
//! Records players, completed game sessions and per-level high scores in
//! SQLite, and serves them over a small JSON HTTP API.
//!
//! # Architecture
//!
//! - **Store**: [`ScoreStore`], diesel over SQLite, one connection per call
//! - **Service**: [`ScoreService`], get-or-create and run recording on top
//! - **Legacy board**: [`ScoreBoard`], in-memory last-write-wins scores
//! - **API**: [`api::router`], axum routes for either backend
//!
//! # Example
//!
//! ```no_run
//! use scorekeep::{NewGameSession, ScoreService, ScoreStore};
//!
//! # fn example() -> Result<(), scorekeep::StoreError> {
//! let store = ScoreStore::new("scores.db".to_string())?;
//! store.run_migrations()?;
//!
//! let service = ScoreService::new(store);
//! let now = scorekeep::now();
//! service.register_player("alice", Some("Alice"), now)?;
//! let outcome = service.record_run(&NewGameSession::new(
//!     "alice".to_string(),
//!     "lvl1".to_string(),
//!     50,
//!     now,
//! ))?;
//! assert!(*outcome.high_score().improved());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
mod config;
mod db;
mod legacy;
mod score_service;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig, ServerMode};

// Crate-level exports - Persistence
pub use db::{
    DEFAULT_BUSY_TIMEOUT_MS, GameSession, HighScore, HighScoreUpdate, MIGRATIONS,
    NewGameSession, Player, RunOutcome, ScoreStore, StoreError, StoreErrorKind,
};

// Crate-level exports - In-memory board
pub use legacy::ScoreBoard;

// Crate-level exports - Service layer
pub use score_service::{DEFAULT_LEVEL, ScoreService, now};
