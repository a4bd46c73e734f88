//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::AppResult;
use crate::history::DEFAULT_RECENT;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, model_enabled: state.hf.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session_id = state.create_session().await;
  (StatusCode::CREATED, Json(SessionCreatedOut { session_id }))
}

#[instrument(level = "info", skip_all, fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> AppResult<Json<SessionOut>> {
  let s = state.session(&id).await?;
  Ok(Json(session_out(&s)))
}

#[instrument(level = "info", skip_all, fields(%id, text_len = body.text.len()))]
pub async fn http_put_article(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<ArticleIn>,
) -> AppResult<StatusCode> {
  set_article(&state, &id, body.text).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip_all, fields(%id))]
pub async fn http_post_questions(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  body: Option<Json<GenerateIn>>,
) -> AppResult<Json<SessionOut>> {
  let article = body.and_then(|Json(b)| b.article);
  let s = generate_questions(&state, &id, article).await?;
  info!(target: "quiz", session = %id, count = s.questions.len(), "HTTP questions served");
  Ok(Json(session_out(&s)))
}

#[instrument(level = "info", skip_all, fields(%id, index = body.index))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> AppResult<StatusCode> {
  answer_question(&state, &id, body.index, body.answer).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip_all, fields(%id))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
  let result = submit_answers(&state, &id).await?;
  info!(target: "quiz", session = %id, score = result.score, total = result.total, saved = result.saved, "HTTP submit evaluated");
  Ok(Json(result))
}

#[instrument(level = "info", skip_all, fields(%id))]
pub async fn http_get_explanation(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> AppResult<Json<ExplanationOut>> {
  let explanation = visible_explanation(&state, &id).await?;
  Ok(Json(ExplanationOut { explanation }))
}

#[instrument(level = "info", skip_all, fields(text_len = body.text.len()))]
pub async fn http_post_translate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TranslateIn>,
) -> AppResult<impl IntoResponse> {
  let result = translate_word(&state, &body.text).await?;
  Ok(Json(result))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_history(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HistoryQuery>,
) -> AppResult<Json<Vec<HistoryEntryOut>>> {
  let records = state.history.recent(q.limit.unwrap_or(DEFAULT_RECENT)).await?;
  Ok(Json(records.iter().map(history_out).collect()))
}
