//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Generating questions (and the article explanation) for a session's article
//!   - Recording and validating answers
//!   - Scoring a submission and appending it to history
//!   - The JA → EN → ZH translation lookup with dictionary enrichment

use tracing::{error, info, instrument, warn};

use crate::domain::{ExampleSentence, HistoryRecord, QuestionResult, Session, Submission, WordLookup};
use crate::extract::{parse_example_sentence, parse_questions, score};
use crate::history::now_stamp;
use crate::script::to_traditional;
use crate::state::AppState;
use crate::util::{fill_template, is_single_word, trunc_for_log};
use crate::error::{AppError, AppResult};

const WORD_NOT_FOUND: &str = "找不到該單詞的詞彙資訊";

#[instrument(level = "info", skip(state, text), fields(%session_id, text_len = text.len()))]
pub async fn set_article(state: &AppState, session_id: &str, text: String) -> AppResult<()> {
  state.with_session(session_id, |s| {
    s.article_text = text;
    Ok(())
  }).await
}

/// Ask the model for questions about the session's article, then for a Chinese explanation.
///
/// Question failures abort and leave the session untouched. An explanation
/// failure is stored as a warning in place of the explanation.
#[instrument(level = "info", skip(state, article), fields(%session_id, has_article = article.is_some()))]
pub async fn generate_questions(state: &AppState, session_id: &str, article: Option<String>) -> AppResult<Session> {
  if let Some(text) = article {
    set_article(state, session_id, text).await?;
  }
  let article = state.session(session_id).await?.article_text;
  if article.trim().is_empty() {
    return Err(AppError::BadRequest("article text is empty".into()));
  }
  let hf = state.hf()?;
  let gen = &state.generation;

  let prompt = fill_template(&state.prompts.questions_template, &[("article", &article)]);
  let raw = hf.chat(&prompt, gen.questions_max_tokens, gen.temperature).await?;
  let questions = match parse_questions(&raw) {
    Ok(qs) => qs,
    Err(e) => {
      error!(target: "quiz", %session_id, error = %e, output = %trunc_for_log(&raw, 200), "Could not extract questions");
      return Err(e);
    }
  };
  if questions.is_empty() {
    warn!(target: "quiz", %session_id, "Model output had no questions");
    return Err(AppError::NoQuestions);
  }
  let count = questions.len();

  let explain_prompt = fill_template(&state.prompts.explanation_template, &[("article", &article)]);
  let explanation = match hf.chat(&explain_prompt, gen.explanation_max_tokens, gen.temperature).await {
    Ok(text) => to_traditional(&text),
    Err(e) => {
      warn!(target: "quiz", %session_id, error = %e, "Explanation generation failed");
      format!("⚠️ 無法生成中文解說：{e}")
    }
  };

  // Questions and explanation land in a single write.
  let session = state.with_session(session_id, |s| {
    s.load_questions(questions);
    s.explanation = Some(explanation);
    Ok(s.clone())
  }).await?;
  info!(target: "quiz", %session_id, count, "Questions generated");
  Ok(session)
}

/// Record the answer for question `index`. Empty clears it.
#[instrument(level = "info", skip(state, answer), fields(%session_id, index))]
pub async fn answer_question(state: &AppState, session_id: &str, index: usize, answer: String) -> AppResult<()> {
  state.with_session(session_id, |s| {
    let q = s.questions.get(index)
      .ok_or_else(|| AppError::BadRequest(format!("question {index} does not exist")))?;
    if !q.accepts(&answer) {
      return Err(AppError::BadRequest(format!("'{answer}' is not an option of question {index}")));
    }
    s.user_answers[index] = answer;
    Ok(())
  }).await
}

/// Score the session, reveal the explanation and append a history record.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn submit_answers(state: &AppState, session_id: &str) -> AppResult<Submission> {
  let session = state.with_session(session_id, |s| {
    if s.questions.is_empty() {
      return Err(AppError::BadRequest("no questions to submit".into()));
    }
    s.submitted = true;
    s.show_explanation = true;
    Ok(s.clone())
  }).await?;

  let total = session.questions.len();
  let correct = score(&session.questions, &session.user_answers);
  let results: Vec<QuestionResult> = session.questions.iter()
    .zip(&session.user_answers)
    .map(|(q, a)| QuestionResult {
      question: q.question.clone(),
      answer: a.clone(),
      correct_answer: q.answer.clone(),
      explanation: q.explanation.clone(),
      correct: *a == q.answer,
    })
    .collect();
  info!(target: "quiz", %session_id, score = correct, total, "Answers submitted");

  let record = HistoryRecord {
    date: now_stamp(),
    score: correct,
    total,
    questions: session.questions.iter().map(|q| q.question.clone()).collect(),
    answers: session.user_answers.clone(),
    correct_answers: session.questions.iter().map(|q| q.answer.clone()).collect(),
    explanations: session.questions.iter().map(|q| q.explanation.clone()).collect(),
    article_explanation: session.explanation.clone(),
  };
  let (saved, save_error) = match state.history.append(record).await {
    Ok(_) => (true, None),
    Err(e) => {
      error!(target: "quiz", %session_id, error = %e, "Failed to save history");
      (false, Some(e.to_string()))
    }
  };

  Ok(Submission {
    score: correct,
    total,
    results,
    explanation: session.explanation,
    saved,
    save_error,
  })
}

/// The article explanation, once answers have been submitted.
pub async fn visible_explanation(state: &AppState, session_id: &str) -> AppResult<Option<String>> {
  let s = state.session(session_id).await?;
  Ok(if s.show_explanation { s.explanation } else { None })
}

/// Translate a Japanese word or phrase and gather dictionary data or an example for it.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn translate_word(state: &AppState, text: &str) -> AppResult<WordLookup> {
  let text = text.trim();
  if text.is_empty() {
    return Err(AppError::BadRequest("nothing to translate".into()));
  }
  let hf = state.hf()?;

  let english = hf.ja_to_en(text).await?;
  let chinese = hf.en_to_zh(&english).await?;
  let translation = to_traditional(&chinese);
  info!(target: "translate", english = %trunc_for_log(&english, 60), translation = %trunc_for_log(&translation, 60), "Translation chain done");

  let english_entry = if is_single_word(&english) {
    let headword = english.trim().trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
    match state.dictionary.lookup_english(&headword).await {
      Ok(entry) => entry,
      Err(e) => {
        warn!(target: "translate", %headword, error = %e, "English dictionary lookup failed");
        None
      }
    }
  } else {
    None
  };

  let word_info = state.dictionary.lookup_japanese(text).await?;
  let (example, note) = match &word_info {
    Some(info) if !info.example_sentence.is_empty() => (None, None),
    Some(_) => {
      let ex = generate_example(state, text).await;
      (Some(ex.map(|raw| parse_example_sentence(&raw)).unwrap_or_else(example_error)), None)
    }
    None => {
      let ex = generate_example(state, text).await;
      let ex = ex.map(|raw| ExampleSentence { raw, ..Default::default() }).unwrap_or_else(example_error);
      (Some(ex), Some(WORD_NOT_FOUND.to_string()))
    }
  };

  Ok(WordLookup {
    text: text.to_string(),
    english,
    translation,
    english_entry,
    word_info,
    example,
    note,
  })
}

async fn generate_example(state: &AppState, word: &str) -> AppResult<String> {
  let prompt = fill_template(&state.prompts.example_template, &[("word", word)]);
  let gen = &state.generation;
  state.hf()?.chat(&prompt, gen.example_max_tokens, gen.temperature).await
}

fn example_error(e: AppError) -> ExampleSentence {
  warn!(target: "translate", error = %e, "Example generation failed");
  ExampleSentence {
    error: Some(format!("生成例句時出錯：{e}")),
    ..Default::default()
  }
}
