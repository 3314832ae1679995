//! HTTP contract tests for both backends.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use scorekeep::api::{self, Backend};
use scorekeep::{ScoreBoard, ScoreService, ScoreStore};

fn legacy_app() -> Router {
    api::router(Backend::Legacy(ScoreBoard::new()))
}

fn persistent_app() -> (NamedTempFile, Router) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store = ScoreStore::new(db_path).expect("Failed to create store");
    store.run_migrations().expect("Migrations failed");
    let app = api::router(Backend::Persistent(ScoreService::new(store)));
    (db_file, app)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

#[tokio::test]
async fn test_legacy_unknown_user_scores_zero() {
    let app = legacy_app();
    let (status, body) = send(&app, "GET", "/get_score/nobody", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "nobody", "score": 0}));
}

#[tokio::test]
async fn test_legacy_last_write_wins() {
    let app = legacy_app();
    for score in [100, 7, 42] {
        let (status, body) = send(
            &app,
            "POST",
            "/update_score",
            Some(json!({"username": "alice", "score": score})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Score updated successfully"}));
    }
    let (_, body) = send(&app, "GET", "/get_score/alice", None).await;
    assert_eq!(body["score"], 42);
}

#[tokio::test]
async fn test_legacy_rejects_malformed_body() {
    let app = legacy_app();
    let (status, body) = send(&app, "POST", "/update_score", Some(json!({"username": "a"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/update_score",
        Some(json!({"username": "a", "score": "three"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = send(&app, "GET", "/get_score/a", None).await;
    assert_eq!(body["score"], 0);
}

#[tokio::test]
async fn test_legacy_stores_any_integer_for_any_name() {
    let app = legacy_app();
    let long_name = "x".repeat(65);
    for (username, score) in [("carol", -5), ("", 3), (long_name.as_str(), i64::MAX)] {
        let (status, _) = send(
            &app,
            "POST",
            "/update_score",
            Some(json!({"username": username, "score": score})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/get_score/carol", None).await;
    assert_eq!(body["score"], -5);
    let (_, body) = send(&app, "GET", &format!("/get_score/{}", long_name), None).await;
    assert_eq!(body["score"], i64::MAX);
}

#[tokio::test]
async fn test_get_score_never_rejects_a_name() {
    let (_db, persistent) = persistent_app();
    let long_name = "y".repeat(65);
    for app in [legacy_app(), persistent] {
        let (status, body) = send(&app, "GET", &format!("/get_score/{}", long_name), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"username": long_name.as_str(), "score": 0}));

        let (status, body) = send(&app, "GET", "/get_score/%20", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"username": " ", "score": 0}));
    }
}

#[tokio::test]
async fn test_legacy_has_no_player_routes() {
    let app = legacy_app();
    let (status, _) = send(&app, "GET", "/players", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_mode() {
    let (_db, app) = persistent_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "mode": "persistent"}));

    let (_, body) = send(&legacy_app(), "GET", "/health", None).await;
    assert_eq!(body["mode"], "legacy");
}

#[tokio::test]
async fn test_persistent_update_score_accumulates() {
    let (_db, app) = persistent_app();
    let (_, body) = send(&app, "GET", "/get_score/bob", None).await;
    assert_eq!(body["score"], 0);

    for score in [50, 30] {
        let (status, body) = send(
            &app,
            "POST",
            "/update_score",
            Some(json!({"username": "bob", "score": score, "level_id": "lvl1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Score updated successfully");
    }

    let (_, body) = send(&app, "GET", "/get_score/bob", None).await;
    assert_eq!(body, json!({"username": "bob", "score": 80}));

    let (status, body) = send(&app, "GET", "/players/bob/high_scores", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["level_id"], "lvl1");
    assert_eq!(body[0]["score"], 50);
}

#[tokio::test]
async fn test_persistent_total_overflow_is_a_bad_request() {
    let (_db, app) = persistent_app();
    let (status, _) = send(
        &app,
        "POST",
        "/update_score",
        Some(json!({"username": "dave", "score": i64::MAX})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/update_score",
        Some(json!({"username": "dave", "score": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, body) = send(&app, "GET", "/players/dave", None).await;
    assert_eq!(body["total_score"], i64::MAX);
    assert_eq!(body["sessions_played"], 1);
}

#[tokio::test]
async fn test_create_and_fetch_player() {
    let (_db, app) = persistent_app();
    let (status, body) = send(
        &app,
        "POST",
        "/players",
        Some(json!({"username": "carol", "display_name": "Carol"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_score"], 0);
    assert_eq!(body["sessions_played"], 0);
    assert_eq!(body["achievements"], json!([]));

    let (status, _) = send(
        &app,
        "POST",
        "/players",
        Some(json!({"username": "carol"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/players/carol", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Carol");

    let (status, body) = send(&app, "GET", "/players/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or_default().contains("nobody"));

    let (_, body) = send(&app, "GET", "/players", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_record_session_flow() {
    let (_db, app) = persistent_app();
    send(&app, "POST", "/players", Some(json!({"username": "dave"}))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({
            "username": "dave",
            "level_id": "World_1",
            "score": 70,
            "collectibles": 3,
            "time_taken": 95,
            "achievements": ["first_blood", "speedrun"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["new_best"], true);
    assert_eq!(body["high_score"]["score"], 70);
    assert_eq!(body["session"]["achievements"], json!(["first_blood", "speedrun"]));

    let (_, body) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({"username": "dave", "level_id": "World_1", "score": 20})),
    )
    .await;
    assert_eq!(body["new_best"], false);
    assert_eq!(body["high_score"]["score"], 70);

    let (_, body) = send(&app, "GET", "/players/dave/sessions", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (_, body) = send(&app, "GET", "/players/dave", None).await;
    assert_eq!(body["total_score"], 90);
    assert_eq!(body["sessions_played"], 2);
}

#[tokio::test]
async fn test_session_for_unknown_player_is_404() {
    let (_db, app) = persistent_app();
    let (status, _) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({"username": "ghost", "level_id": "lvl1", "score": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/get_score/ghost", None).await;
    assert_eq!(body["score"], 0);
}

#[tokio::test]
async fn test_session_validation() {
    let (_db, app) = persistent_app();
    send(&app, "POST", "/players", Some(json!({"username": "erin"}))).await;

    for bad in [
        json!({"username": "erin", "level_id": "lvl1", "score": -1}),
        json!({"username": "erin", "level_id": "", "score": 1}),
        json!({"username": "erin", "level_id": "lvl1", "score": 1, "collectibles": -2}),
        json!({"username": "erin", "level_id": "lvl1", "score": 1, "achievements": [""]}),
        json!({"username": "erin", "level_id": "lvl1", "score": "lots"}),
    ] {
        let (status, _) = send(&app, "POST", "/sessions", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, body) = send(&app, "GET", "/players/erin", None).await;
    assert_eq!(body["sessions_played"], 0);
}

#[tokio::test]
async fn test_award_achievement_route() {
    let (_db, app) = persistent_app();
    send(&app, "POST", "/players", Some(json!({"username": "finn"}))).await;

    for achievement in ["first_blood", "speedrun", "first_blood"] {
        let (status, _) = send(
            &app,
            "POST",
            "/players/finn/achievements",
            Some(json!({"achievement": achievement})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = send(&app, "GET", "/players/finn", None).await;
    assert_eq!(body["achievements"], json!(["first_blood", "speedrun"]));
}

#[tokio::test]
async fn test_level_leaderboard_route() {
    let (_db, app) = persistent_app();
    for (name, score) in [("g1", 10), ("g2", 40), ("g3", 25)] {
        send(
            &app,
            "POST",
            "/update_score",
            Some(json!({"username": name, "score": score, "level_id": "boss"})),
        )
        .await;
    }

    let (status, body) = send(&app, "GET", "/levels/boss/high_scores?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .expect("Expected array")
        .iter()
        .map(|h| h["username"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, ["g2", "g3"]);

    let (status, _) = send(&app, "GET", "/levels/boss/high_scores?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
