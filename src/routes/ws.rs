//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::AppResult;
use crate::history::DEFAULT_RECENT;
use crate::logic::*;
use crate::protocol::{history_out, session_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "dokkai_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "dokkai_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "dokkai_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { code: "BAD_REQUEST".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "code": "SERDE_ERROR", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "dokkai_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "dokkai_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  dispatch(msg, state).await.unwrap_or_else(|e| {
    error!(target: "dokkai_backend", code = e.code(), error = %e, "WS request failed");
    ServerWsMessage::Error { code: e.code().into(), message: e.to_string() }
  })
}

async fn dispatch(msg: ClientWsMessage, state: &AppState) -> AppResult<ServerWsMessage> {
  Ok(match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewSession => {
      let session_id = state.create_session().await;
      let session = session_out(&state.session(&session_id).await?);
      ServerWsMessage::Session { session_id, session }
    }

    ClientWsMessage::GetSession { session_id } => {
      let session = session_out(&state.session(&session_id).await?);
      ServerWsMessage::Session { session_id, session }
    }

    ClientWsMessage::SetArticle { session_id, text } => {
      set_article(state, &session_id, text).await?;
      ServerWsMessage::Ok
    }

    ClientWsMessage::GenerateQuestions { session_id, article } => {
      let s = generate_questions(state, &session_id, article).await?;
      info!(target: "quiz", session = %session_id, count = s.questions.len(), "WS questions served");
      ServerWsMessage::Session { session_id, session: session_out(&s) }
    }

    ClientWsMessage::Answer { session_id, index, answer } => {
      answer_question(state, &session_id, index, answer).await?;
      ServerWsMessage::Ok
    }

    ClientWsMessage::Submit { session_id } => {
      let result = submit_answers(state, &session_id).await?;
      info!(target: "quiz", session = %session_id, score = result.score, total = result.total, "WS submit evaluated");
      ServerWsMessage::SubmitResult { result }
    }

    ClientWsMessage::Translate { text } => {
      let result = translate_word(state, &text).await?;
      ServerWsMessage::Translation { result }
    }

    ClientWsMessage::History { limit } => {
      let records = state.history.recent(limit.unwrap_or(DEFAULT_RECENT)).await?;
      ServerWsMessage::History { entries: records.iter().map(history_out).collect() }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logic::tests::{test_state, Stub};

  #[tokio::test]
  async fn ws_quiz_flow_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(Stub::default(), &dir).await;

    let ServerWsMessage::Session { session_id, .. } = handle_client_ws(ClientWsMessage::NewSession, &state).await else {
      panic!("expected session");
    };
    let msg = ClientWsMessage::GenerateQuestions { session_id: session_id.clone(), article: Some("本文".into()) };
    assert!(matches!(handle_client_ws(msg, &state).await, ServerWsMessage::Session { .. }));

    let msg = ClientWsMessage::Answer { session_id: session_id.clone(), index: 1, answer: "晴れ".into() };
    assert!(matches!(handle_client_ws(msg, &state).await, ServerWsMessage::Ok));

    match handle_client_ws(ClientWsMessage::Submit { session_id }, &state).await {
      ServerWsMessage::SubmitResult { result } => assert_eq!(result.score, 1),
      other => panic!("unexpected {other:?}"),
    }

    match handle_client_ws(ClientWsMessage::History { limit: None }, &state).await {
      ServerWsMessage::History { entries } => {
        assert_eq!(entries.len(), 1);
        assert!(entries[0].results[1].correct);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[tokio::test]
  async fn ws_errors_carry_codes() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(Stub::default(), &dir).await;
    match handle_client_ws(ClientWsMessage::Submit { session_id: "missing".into() }, &state).await {
      ServerWsMessage::Error { code, .. } => assert_eq!(code, "NOT_FOUND"),
      other => panic!("unexpected {other:?}"),
    }
  }
}
