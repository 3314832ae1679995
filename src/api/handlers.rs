//! Handlers backed by the persistent store.
//!
//! Store calls block on SQLite, so each one runs on the blocking pool.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::{debug, instrument};

use crate::api::dto::{
    AwardAchievementRequest, CreatePlayerRequest, LeaderboardQuery, MessageResponse,
    RecordSessionRequest, RecordSessionResponse, SCORE_UPDATED, ScoreResponse,
    UpdateScoreRequest,
};
use crate::api::{ApiError, validation};
use crate::score_service::{DEFAULT_LEVEL, now};
use crate::{GameSession, HighScore, NewGameSession, Player, ScoreService, StoreError};

/// Runs a store operation on the blocking pool.
async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("Store task failed: {}", e),
        })?
        .map_err(ApiError::from)
}

/// `POST /update_score`: record the score as a completed run.
#[instrument(skip_all)]
pub async fn update_score(
    State(service): State<ScoreService>,
    payload: Result<Json<UpdateScoreRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    validation::username(&req.username)?;
    validation::non_negative("score", req.score)?;
    let level_id = req.level_id.unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    validation::level_id(&level_id)?;

    let outcome = blocking(move || {
        service.submit_score(&req.username, &level_id, req.score, now())
    })
    .await?;
    debug!(session_id = outcome.session().id(), "Score submitted");

    Ok(Json(MessageResponse {
        message: SCORE_UPDATED.to_string(),
    }))
}

/// `GET /get_score/{username}`: accumulated score, 0 when unknown.
///
/// The name is only looked up, so one no player could register under still
/// reads as 0.
#[instrument(skip(service))]
pub async fn get_score(
    State(service): State<ScoreService>,
    Path(username): Path<String>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let lookup = username.clone();
    let score = blocking(move || service.score_of(&lookup)).await?;
    Ok(Json(ScoreResponse { username, score }))
}

/// `POST /players`: register a player.
#[instrument(skip_all)]
pub async fn create_player(
    State(service): State<ScoreService>,
    payload: Result<Json<CreatePlayerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let Json(req) = payload?;
    validation::username(&req.username)?;
    if let Some(name) = &req.display_name {
        validation::display_name(name)?;
    }

    let player = blocking(move || {
        service.register_player(&req.username, req.display_name.as_deref(), now())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// `GET /players`: all players in registration order.
#[instrument(skip_all)]
pub async fn list_players(
    State(service): State<ScoreService>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let players = blocking(move || service.players()).await?;
    Ok(Json(players))
}

/// `GET /players/{username}`: one player.
#[instrument(skip(service))]
pub async fn get_player(
    State(service): State<ScoreService>,
    Path(username): Path<String>,
) -> Result<Json<Player>, ApiError> {
    validation::username(&username)?;
    let player = blocking(move || service.player(&username)).await?;
    Ok(Json(player))
}

/// `POST /players/{username}/achievements`: award an achievement.
#[instrument(skip(service, payload))]
pub async fn award_achievement(
    State(service): State<ScoreService>,
    Path(username): Path<String>,
    payload: Result<Json<AwardAchievementRequest>, JsonRejection>,
) -> Result<Json<Player>, ApiError> {
    let Json(req) = payload?;
    validation::username(&username)?;
    validation::achievements(&[&req.achievement])?;

    let player = blocking(move || service.award_achievement(&username, &req.achievement)).await?;
    Ok(Json(player))
}

/// `POST /sessions`: record a completed run with full details.
#[instrument(skip_all)]
pub async fn record_session(
    State(service): State<ScoreService>,
    payload: Result<Json<RecordSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordSessionResponse>), ApiError> {
    let Json(req) = payload?;
    validation::username(&req.username)?;
    validation::level_id(&req.level_id)?;
    validation::non_negative("score", req.score)?;
    validation::non_negative("collectibles", req.collectibles)?;
    validation::non_negative("time_taken", req.time_taken)?;
    validation::achievements(&req.achievements)?;

    let session = NewGameSession::new(
        req.username,
        req.level_id,
        req.score,
        req.completed_at.unwrap_or_else(now),
    )
    .with_collectibles(req.collectibles)
    .with_time_taken(req.time_taken)
    .with_achievements(req.achievements);

    let outcome = blocking(move || service.record_run(&session)).await?;
    let response = RecordSessionResponse {
        session: outcome.session().clone(),
        high_score: outcome.high_score().high_score().clone(),
        new_best: *outcome.high_score().improved(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /players/{username}/sessions`: history, most recent first.
#[instrument(skip(service))]
pub async fn player_sessions(
    State(service): State<ScoreService>,
    Path(username): Path<String>,
) -> Result<Json<Vec<GameSession>>, ApiError> {
    validation::username(&username)?;
    let sessions = blocking(move || service.history(&username)).await?;
    Ok(Json(sessions))
}

/// `GET /players/{username}/high_scores`: best per level.
#[instrument(skip(service))]
pub async fn player_high_scores(
    State(service): State<ScoreService>,
    Path(username): Path<String>,
) -> Result<Json<Vec<HighScore>>, ApiError> {
    validation::username(&username)?;
    let scores = blocking(move || service.high_scores(&username)).await?;
    Ok(Json(scores))
}

/// `GET /levels/{level_id}/high_scores?limit=N`: top scores on a level.
#[instrument(skip(service, query))]
pub async fn level_leaderboard(
    State(service): State<ScoreService>,
    Path(level_id): Path<String>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<HighScore>>, ApiError> {
    let Query(query) = query?;
    validation::level_id(&level_id)?;
    let limit = validation::leaderboard_limit(query.limit)?;
    let scores = blocking(move || service.leaderboard(&level_id, limit)).await?;
    Ok(Json(scores))
}
