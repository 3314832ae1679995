//! HTTP surface: routes, request validation and error mapping.

mod dto;
mod error;
mod handlers;
mod legacy;
pub mod validation;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, instrument, warn};

use crate::{ScoreBoard, ScoreService, ServerMode};

pub use dto::{
    AwardAchievementRequest, CreatePlayerRequest, HealthResponse, LeaderboardQuery,
    MessageResponse, RecordSessionRequest, RecordSessionResponse, SCORE_UPDATED, ScoreResponse,
    UpdateScoreRequest,
};
pub use error::{ApiError, ErrorBody};

/// What the routes are served from.
#[derive(Debug, Clone)]
pub enum Backend {
    /// SQLite-backed players, sessions and high scores.
    Persistent(ScoreService),
    /// In-memory last-write-wins board.
    Legacy(ScoreBoard),
}

impl Backend {
    /// Mode this backend corresponds to.
    pub fn mode(&self) -> ServerMode {
        match self {
            Self::Persistent(_) => ServerMode::Persistent,
            Self::Legacy(_) => ServerMode::Legacy,
        }
    }
}

/// Builds the application router for a backend.
///
/// Both modes serve `/update_score`, `/get_score/{username}` and `/health`.
/// The persistent mode adds the player, session and leaderboard routes.
#[instrument(skip(backend))]
pub fn router(backend: Backend) -> Router {
    let mode = backend.mode();
    info!(%mode, "Building router");

    let app = match backend {
        Backend::Legacy(board) => Router::new()
            .route("/update_score", post(legacy::update_score))
            .route("/get_score/{username}", get(legacy::get_score))
            .with_state(board),
        Backend::Persistent(service) => Router::new()
            .route("/update_score", post(handlers::update_score))
            .route("/get_score/{username}", get(handlers::get_score))
            .route(
                "/players",
                post(handlers::create_player).get(handlers::list_players),
            )
            .route("/players/{username}", get(handlers::get_player))
            .route(
                "/players/{username}/achievements",
                post(handlers::award_achievement),
            )
            .route("/players/{username}/sessions", get(handlers::player_sessions))
            .route(
                "/players/{username}/high_scores",
                get(handlers::player_high_scores),
            )
            .route("/sessions", post(handlers::record_session))
            .route(
                "/levels/{level_id}/high_scores",
                get(handlers::level_leaderboard),
            )
            .with_state(service),
    };

    app.route(
        "/health",
        get(move || async move {
            Json(HealthResponse {
                status: "ok".to_string(),
                mode: mode.to_string(),
            })
        }),
    )
    .layer(middleware::from_fn(log_requests))
}

/// Logs every request and the status it was answered with.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    info!(method = %method, uri = %uri, "Incoming HTTP request");

    let response = next.run(req).await;
    let status = response.status();
    if status.is_server_error() {
        warn!(method = %method, uri = %uri, status = %status, "Request failed");
    } else {
        info!(method = %method, uri = %uri, status = %status, "Response sent");
    }
    response
}
