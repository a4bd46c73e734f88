//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Optional static frontend from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/session", post(http::http_create_session))
        .route("/api/v1/session/:id", get(http::http_get_session))
        .route("/api/v1/session/:id/article", put(http::http_put_article))
        .route("/api/v1/session/:id/questions", post(http::http_post_questions))
        .route("/api/v1/session/:id/answer", post(http::http_post_answer))
        .route("/api/v1/session/:id/submit", post(http::http_post_submit))
        .route("/api/v1/session/:id/explanation", get(http::http_get_explanation))
        .route("/api/v1/translate", post(http::http_post_translate))
        .route("/api/v1/history", get(http::http_get_history))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::tests::{test_state, Stub};
    use crate::test_support::spawn_stub;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn http_quiz_and_translate_flow() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(test_state(Stub::default(), &dir).await);
        let base = spawn_stub(build_router(state)).await;
        let http = reqwest::Client::new();

        let health: Value = http.get(format!("{base}/api/v1/health")).send().await.unwrap().json().await.unwrap();
        assert_eq!(health["modelEnabled"], true);

        let created = http.post(format!("{base}/api/v1/session")).send().await.unwrap();
        assert_eq!(created.status(), 201);
        let id = created.json::<Value>().await.unwrap()["sessionId"].as_str().unwrap().to_string();

        let res = http.put(format!("{base}/api/v1/session/{id}/article"))
            .json(&json!({"text": "昨日、京都へ行きました。"})).send().await.unwrap();
        assert_eq!(res.status(), 204);

        let session: Value = http.post(format!("{base}/api/v1/session/{id}/questions"))
            .send().await.unwrap().json().await.unwrap();
        assert_eq!(session["questions"].as_array().unwrap().len(), 2);
        assert!(session["questions"][0].get("answer").is_none());

        let bad = http.post(format!("{base}/api/v1/session/{id}/answer"))
            .json(&json!({"index": 0, "answer": "ロンドン"})).send().await.unwrap();
        assert_eq!(bad.status(), 400);
        let err: Value = bad.json().await.unwrap();
        assert_eq!(err["error"]["code"], "BAD_REQUEST");

        let ok = http.post(format!("{base}/api/v1/session/{id}/answer"))
            .json(&json!({"index": 0, "answer": "京都"})).send().await.unwrap();
        assert_eq!(ok.status(), 204);

        let hidden: Value = http.get(format!("{base}/api/v1/session/{id}/explanation"))
            .send().await.unwrap().json().await.unwrap();
        assert!(hidden["explanation"].is_null());

        let sub: Value = http.post(format!("{base}/api/v1/session/{id}/submit"))
            .send().await.unwrap().json().await.unwrap();
        assert_eq!(sub["score"], 1);
        assert_eq!(sub["total"], 2);
        assert_eq!(sub["saved"], true);

        let shown: Value = http.get(format!("{base}/api/v1/session/{id}/explanation"))
            .send().await.unwrap().json().await.unwrap();
        assert_eq!(shown["explanation"], "這篇文章講的是旅行。");

        let history: Value = http.get(format!("{base}/api/v1/history?limit=5"))
            .send().await.unwrap().json().await.unwrap();
        assert_eq!(history.as_array().unwrap().len(), 1);

        let tr: Value = http.post(format!("{base}/api/v1/translate"))
            .json(&json!({"text": "猫"})).send().await.unwrap().json().await.unwrap();
        assert_eq!(tr["english"], "cat");
        assert_eq!(tr["wordInfo"]["reading"], "ねこ");
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(test_state(Stub::default(), &dir).await);
        let base = spawn_stub(build_router(state)).await;
        let res = reqwest::get(format!("{base}/api/v1/session/nope")).await.unwrap();
        assert_eq!(res.status(), 404);
    }
}
