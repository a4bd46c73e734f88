//! Domain models: quiz questions, session state, history records and lookup results.

use serde::{Deserialize, Serialize};

/// One multiple-choice comprehension question, as produced by the model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub question: String,
  #[serde(default)]
  pub options: Vec<String>,
  pub answer: String,
  #[serde(default)]
  pub explanation: String,
}

impl Question {
  /// Empty means "not answered yet"; anything else must be one of the options.
  pub fn accepts(&self, answer: &str) -> bool {
    answer.is_empty() || self.options.iter().any(|o| o == answer)
  }
}

/// Per-user quiz state. Lives in memory only; submissions are mirrored to history.
#[derive(Clone, Debug, Default)]
pub struct Session {
  pub article_text: String,
  pub questions: Vec<Question>,
  /// Always the same length as `questions`.
  pub user_answers: Vec<String>,
  pub submitted: bool,
  pub explanation: Option<String>,
  pub show_explanation: bool,
}

impl Session {
  /// Replace the quiz with freshly generated questions and reset everything derived from it.
  pub fn load_questions(&mut self, questions: Vec<Question>) {
    self.user_answers = vec![String::new(); questions.len()];
    self.questions = questions;
    self.submitted = false;
    self.explanation = None;
    self.show_explanation = false;
  }
}

/// One entry of the score history file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRecord {
  /// Local time, `%Y-%m-%d %H:%M:%S`.
  pub date: String,
  pub score: usize,
  pub total: usize,
  pub questions: Vec<String>,
  pub answers: Vec<String>,
  pub correct_answers: Vec<String>,
  pub explanations: Vec<String>,
  pub article_explanation: Option<String>,
}

impl HistoryRecord {
  /// Per-question breakdown, for display.
  pub fn results(&self) -> Vec<QuestionResult> {
    self.questions.iter()
      .zip(&self.answers)
      .zip(&self.correct_answers)
      .enumerate()
      .map(|(i, ((q, a), c))| QuestionResult {
        question: q.clone(),
        answer: a.clone(),
        correct_answer: c.clone(),
        explanation: self.explanations.get(i).cloned().unwrap_or_default(),
        correct: a == c,
      })
      .collect()
  }
}

/// Outcome of one question after submission.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
  pub question: String,
  pub answer: String,
  pub correct_answer: String,
  pub explanation: String,
  pub correct: bool,
}

/// Outcome of submitting a session's answers.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub score: usize,
  pub total: usize,
  pub results: Vec<QuestionResult>,
  pub explanation: Option<String>,
  /// False when the history file could not be written; the score still stands.
  pub saved: bool,
  pub save_error: Option<String>,
}

/// Everything the translation lookup produced for one input.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordLookup {
  pub text: String,
  /// Intermediate English translation.
  pub english: String,
  /// Final Chinese translation, Traditional script.
  pub translation: String,
  pub english_entry: Option<EnglishEntry>,
  pub word_info: Option<WordInfo>,
  pub example: Option<ExampleSentence>,
  pub note: Option<String>,
}

/// Jisho dictionary summary for a Japanese word.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct WordInfo {
  pub word: String,
  pub reading: String,
  pub part_of_speech: Vec<String>,
  pub english_definitions: Vec<String>,
  /// First Japanese example sentence, or empty.
  pub example_sentence: String,
}

/// dictionaryapi.dev summary for an English word.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnglishEntry {
  pub part_of_speech: String,
  pub definition: String,
  pub example: String,
}

/// A model-generated usage example for a word.
#[derive(Clone, Debug, Serialize, Default, PartialEq, Eq)]
pub struct ExampleSentence {
  pub raw: String,
  pub ja: Option<String>,
  /// Traditional script.
  pub zh: Option<String>,
  /// Set instead of the fields above when generation failed.
  pub error: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q() -> Question {
    Question {
      question: "猫はどこにいますか。".into(),
      options: vec!["家".into(), "庭".into(), "駅".into(), "店".into()],
      answer: "庭".into(),
      explanation: "本文に「庭で寝ている」とある。".into(),
    }
  }

  #[test]
  fn accepts_empty_or_own_option_only() {
    let q = q();
    assert!(q.accepts(""));
    assert!(q.accepts("駅"));
    assert!(!q.accepts("学校"));
  }

  #[test]
  fn load_questions_resets_answers_and_flags() {
    let mut s = Session {
      submitted: true,
      show_explanation: true,
      explanation: Some("old".into()),
      ..Default::default()
    };
    s.load_questions(vec![q(), q()]);
    assert_eq!(s.user_answers, vec![String::new(), String::new()]);
    assert!(!s.submitted);
    assert!(!s.show_explanation);
    assert!(s.explanation.is_none());
  }

  #[test]
  fn history_results_mark_correctness() {
    let r = HistoryRecord {
      date: "2026-10-19 10:00:00".into(),
      score: 1,
      total: 2,
      questions: vec!["Q1".into(), "Q2".into()],
      answers: vec!["庭".into(), "家".into()],
      correct_answers: vec!["庭".into(), "駅".into()],
      explanations: vec!["e1".into()],
      article_explanation: None,
    };
    let res = r.results();
    assert_eq!(res.len(), 2);
    assert!(res[0].correct);
    assert!(!res[1].correct);
    assert_eq!(res[0].explanation, "e1");
    assert_eq!(res[1].explanation, "");
  }

  #[test]
  fn question_explanation_defaults_to_empty() {
    let q: Question =
      serde_json::from_str(r#"{"question":"q","options":["a","b"],"answer":"a"}"#).unwrap();
    assert_eq!(q.explanation, "");
  }
}
