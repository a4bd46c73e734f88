//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{HistoryRecord, QuestionResult, Session, Submission, WordLookup};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  NewSession,
  GetSession {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  SetArticle {
    #[serde(rename = "sessionId")]
    session_id: String,
    text: String,
  },
  GenerateQuestions {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(default)]
    article: Option<String>,
  },
  Answer {
    #[serde(rename = "sessionId")]
    session_id: String,
    index: usize,
    answer: String,
  },
  Submit {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  Translate {
    text: String,
  },
  History {
    #[serde(default)]
    limit: Option<usize>,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Session {
    #[serde(rename = "sessionId")]
    session_id: String,
    session: SessionOut,
  },
  Ok,
  SubmitResult {
    result: Submission,
  },
  Translation {
    result: WordLookup,
  },
  History {
    entries: Vec<HistoryEntryOut>,
  },
  Error {
    code: String,
    message: String,
  },
}

/// A question as shown to the learner. Key and explanation only after submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
  pub question: String,
  pub options: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub answer: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
  pub article_text: String,
  pub questions: Vec<QuestionOut>,
  pub user_answers: Vec<String>,
  pub submitted: bool,
  pub show_explanation: bool,
  /// Only once revealed.
  pub explanation: Option<String>,
}

/// Convert an internal `Session` to the public DTO, hiding the key until submission.
pub fn session_out(s: &Session) -> SessionOut {
  SessionOut {
    article_text: s.article_text.clone(),
    questions: s.questions.iter().map(|q| QuestionOut {
      question: q.question.clone(),
      options: q.options.clone(),
      answer: s.submitted.then(|| q.answer.clone()),
      explanation: s.submitted.then(|| q.explanation.clone()),
    }).collect(),
    user_answers: s.user_answers.clone(),
    submitted: s.submitted,
    show_explanation: s.show_explanation,
    explanation: if s.show_explanation { s.explanation.clone() } else { None },
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryOut {
  pub date: String,
  pub score: usize,
  pub total: usize,
  pub results: Vec<QuestionResult>,
  pub article_explanation: Option<String>,
}

pub fn history_out(r: &HistoryRecord) -> HistoryEntryOut {
  HistoryEntryOut {
    date: r.date.clone(),
    score: r.score,
    total: r.total,
    results: r.results(),
    article_explanation: r.article_explanation.clone(),
  }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  #[serde(rename = "modelEnabled")]
  pub model_enabled: bool,
}

#[derive(Serialize)]
pub struct SessionCreatedOut {
  #[serde(rename = "sessionId")]
  pub session_id: String,
}

#[derive(Deserialize)]
pub struct ArticleIn {
  pub text: String,
}

#[derive(Deserialize, Default)]
pub struct GenerateIn {
  #[serde(default)]
  pub article: Option<String>,
}

#[derive(Deserialize)]
pub struct AnswerIn {
  pub index: usize,
  pub answer: String,
}

#[derive(Serialize)]
pub struct ExplanationOut {
  pub explanation: Option<String>,
}

#[derive(Deserialize)]
pub struct TranslateIn {
  pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
  pub limit: Option<usize>,
}
