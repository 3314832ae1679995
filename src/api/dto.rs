//! Request and response bodies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{GameSession, HighScore};

/// Message returned by `POST /update_score`.
pub const SCORE_UPDATED: &str = "Score updated successfully";

/// Body of `POST /update_score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScoreRequest {
    /// Player reporting the score.
    pub username: String,
    /// Score reached.
    pub score: i64,
    /// Level the score was reached on. Ignored by the in-memory board.
    #[serde(default)]
    pub level_id: Option<String>,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Acknowledgement text.
    pub message: String,
}

/// Body of `GET /get_score/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Player asked about.
    pub username: String,
    /// Their score, 0 when unknown.
    pub score: i64,
}

/// Body of `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlayerRequest {
    /// Unique username.
    pub username: String,
    /// Shown name; defaults to the username.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Body of `POST /players/{username}/achievements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardAchievementRequest {
    /// Achievement id to award.
    pub achievement: String,
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSessionRequest {
    /// Registered player who played.
    pub username: String,
    /// Level played.
    pub level_id: String,
    /// Score earned.
    pub score: i64,
    /// Collectibles picked up.
    #[serde(default)]
    pub collectibles: i64,
    /// Seconds taken.
    #[serde(default)]
    pub time_taken: i64,
    /// Achievements earned during the run, in order.
    #[serde(default)]
    pub achievements: Vec<String>,
    /// Completion time; defaults to when the request is handled.
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

/// Response of `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSessionResponse {
    /// The stored session.
    pub session: GameSession,
    /// The player's best on that level after this run.
    pub high_score: HighScore,
    /// Whether this run set that best.
    pub new_best: bool,
}

/// Query of `GET /levels/{level_id}/high_scores`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    /// Maximum rows to return.
    pub limit: Option<i64>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Backend the server runs with.
    pub mode: String,
}
