//! Handlers for the in-memory last-write-wins board.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use tracing::{info, instrument};

use crate::ScoreBoard;
use crate::api::dto::{MessageResponse, SCORE_UPDATED, ScoreResponse, UpdateScoreRequest};
use crate::api::ApiError;

/// `POST /update_score`: overwrite the player's score.
///
/// Any username string and any integer score are stored as given; only a
/// missing or mistyped field is rejected.
#[instrument(skip_all)]
pub async fn update_score(
    State(board): State<ScoreBoard>,
    payload: Result<Json<UpdateScoreRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    board.update_score(&req.username, req.score);
    info!(username = %req.username, score = req.score, "Score stored in memory");
    Ok(Json(MessageResponse {
        message: SCORE_UPDATED.to_string(),
    }))
}

/// `GET /get_score/{username}`: last score reported, 0 when none.
#[instrument(skip(board))]
pub async fn get_score(
    State(board): State<ScoreBoard>,
    Path(username): Path<String>,
) -> Json<ScoreResponse> {
    let score = board.get_score(&username);
    Json(ScoreResponse { username, score })
}
