//! Database models and domain types.
//!
//! `*Row` types mirror table layouts (achievements as stored text). The
//! domain types carry achievements as ordered lists and are what the rest of
//! the crate sees.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{StoreError, achievements, schema};

/// Registered player with accumulated statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    username: String,
    display_name: String,
    created_at: NaiveDateTime,
    total_score: i64,
    sessions_played: i64,
    achievements: Vec<String>,
}

/// Stored form of a [`Player`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::players)]
pub(crate) struct PlayerRow {
    pub(crate) username: String,
    pub(crate) display_name: String,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) total_score: i64,
    pub(crate) sessions_played: i64,
    pub(crate) achievements: String,
}

impl TryFrom<PlayerRow> for Player {
    type Error = StoreError;

    #[instrument(skip(row), fields(username = %row.username))]
    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            achievements: achievements::decode(&row.achievements)?,
            username: row.username,
            display_name: row.display_name,
            created_at: row.created_at,
            total_score: row.total_score,
            sessions_played: row.sessions_played,
        })
    }
}

/// Insertable player. Counters and achievements take the column defaults.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::players)]
pub(crate) struct NewPlayerRow<'a> {
    username: &'a str,
    display_name: &'a str,
    created_at: NaiveDateTime,
}

/// One completed play-through. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GameSession {
    id: i64,
    username: String,
    level_id: String,
    score: i64,
    completed_at: NaiveDateTime,
    collectibles: i64,
    time_taken: i64,
    achievements: Vec<String>,
}

/// Stored form of a [`GameSession`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::game_sessions)]
pub(crate) struct GameSessionRow {
    id: i64,
    username: String,
    level_id: String,
    score: i64,
    completed_at: NaiveDateTime,
    collectibles: i64,
    time_taken: i64,
    achievements: String,
}

impl TryFrom<GameSessionRow> for GameSession {
    type Error = StoreError;

    #[instrument(skip(row), fields(session_id = row.id))]
    fn try_from(row: GameSessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            achievements: achievements::decode(&row.achievements)?,
            id: row.id,
            username: row.username,
            level_id: row.level_id,
            score: row.score,
            completed_at: row.completed_at,
            collectibles: row.collectibles,
            time_taken: row.time_taken,
        })
    }
}

pub use new_session::NewGameSession;

// `Setters` emits the `with_*` methods without docs.
#[allow(missing_docs)]
mod new_session {
    use chrono::NaiveDateTime;
    use derive_getters::Getters;
    use derive_new::new;
    use derive_setters::Setters;

    /// A session to record. `collectibles`, `time_taken` and `achievements`
    /// default to zero/empty and can be set with the `with_*` methods.
    #[derive(Debug, Clone, PartialEq, Eq, new, Getters, Setters)]
    #[setters(prefix = "with_")]
    pub struct NewGameSession {
        #[setters(skip)]
        username: String,
        #[setters(skip)]
        level_id: String,
        #[setters(skip)]
        score: i64,
        #[setters(skip)]
        completed_at: NaiveDateTime,
        /// Items picked up during the run.
        #[new(default)]
        collectibles: i64,
        /// Run length in seconds.
        #[new(default)]
        time_taken: i64,
        /// Achievements earned during the run, in order.
        #[new(default)]
        achievements: Vec<String>,
    }
}

/// Insertable session row with achievements already encoded.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::game_sessions)]
pub(crate) struct NewGameSessionRow<'a> {
    username: &'a str,
    level_id: &'a str,
    score: i64,
    completed_at: NaiveDateTime,
    collectibles: i64,
    time_taken: i64,
    achievements: String,
}

impl<'a> NewGameSessionRow<'a> {
    /// Encodes a [`NewGameSession`] for insertion.
    #[instrument(skip(session), fields(username = %session.username()))]
    pub(crate) fn encode(session: &'a NewGameSession) -> Result<Self, StoreError> {
        Ok(Self {
            username: session.username(),
            level_id: session.level_id(),
            score: *session.score(),
            completed_at: *session.completed_at(),
            collectibles: *session.collectibles(),
            time_taken: *session.time_taken(),
            achievements: achievements::encode(session.achievements())?,
        })
    }
}

/// Best score a player has reached on one level.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Selectable,
    Insertable,
    Serialize,
    Deserialize,
    Getters,
    new,
)]
#[diesel(table_name = schema::high_scores)]
pub struct HighScore {
    username: String,
    level_id: String,
    score: i64,
    achieved_at: NaiveDateTime,
}

/// Result of submitting a score to the high-score tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct HighScoreUpdate {
    /// Row as stored after the submission.
    high_score: HighScore,
    /// Whether the submission inserted or replaced the row.
    improved: bool,
}

/// Result of recording a completed run: the session and its high-score effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct RunOutcome {
    session: GameSession,
    high_score: HighScoreUpdate,
}
