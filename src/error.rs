//! Error type shared by the client, the orchestration layer and the handlers.
//!
//! Every failure ends up as a user-visible message: over HTTP as
//! `{"error": {"code", "message"}}` with a mapped status, over WebSocket as an
//! `error` message.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Invalid request: {0}")]
  BadRequest(String),

  #[error("Not found: {0}")]
  NotFound(String),

  /// No inference token configured.
  #[error("Inference API disabled (HF_TOKEN not set)")]
  ModelUnavailable,

  #[error("API error {status}: {message}")]
  Upstream { status: u16, message: String },

  #[error("HTTP transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Malformed response: {0}")]
  MalformedResponse(String),

  #[error("No JSON object found in model output")]
  NoJsonFound,

  #[error("JSON decode failed: {message}")]
  InvalidJson { message: String, text: String },

  #[error("Model returned no questions")]
  NoQuestions,

  /// Server misconfiguration (bad endpoint URL and the like).
  #[error("Configuration error: {0}")]
  Config(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Serde(#[from] serde_json::Error),
}

impl AppError {
  pub fn code(&self) -> &'static str {
    match self {
      AppError::BadRequest(_) => "BAD_REQUEST",
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::ModelUnavailable => "MODEL_UNAVAILABLE",
      AppError::Upstream { .. } => "UPSTREAM_ERROR",
      AppError::Transport(_) => "TRANSPORT_ERROR",
      AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
      AppError::NoJsonFound => "NO_JSON_FOUND",
      AppError::InvalidJson { .. } => "INVALID_JSON",
      AppError::NoQuestions => "NO_QUESTIONS",
      AppError::Config(_) => "CONFIG_ERROR",
      AppError::Io(_) => "IO_ERROR",
      AppError::Serde(_) => "SERDE_ERROR",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Upstream { .. }
      | AppError::Transport(_)
      | AppError::MalformedResponse(_)
      | AppError::NoJsonFound
      | AppError::InvalidJson { .. }
      | AppError::NoQuestions => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Io(_) | AppError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    let mut error = json!({
      "code": self.code(),
      "message": self.to_string(),
    });
    // Show the offending model text so the user can see why decoding failed.
    if let AppError::InvalidJson { text, .. } = &self {
      error["text"] = json!(text);
    }
    (status, Json(json!({ "error": error }))).into_response()
  }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn upstream_errors_map_to_bad_gateway() {
    let e = AppError::Upstream { status: 503, message: "loading".into() };
    assert_eq!(e.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(e.code(), "UPSTREAM_ERROR");
    assert_eq!(e.to_string(), "API error 503: loading");
  }

  #[test]
  fn client_errors_keep_their_status() {
    assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::ModelUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn config_errors_are_server_side() {
    let e = AppError::Config("invalid DICTIONARY_BASE_URL".into());
    assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(e.code(), "CONFIG_ERROR");
  }
}
