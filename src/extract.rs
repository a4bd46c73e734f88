//! Parsing of semi-structured model output, plus scoring.
//!
//! Small models rarely return clean JSON even when told to, so questions are cut
//! out of the surrounding prose before decoding. Example sentences come back as
//! labelled lines rather than JSON.

use serde::Deserialize;

use crate::domain::{ExampleSentence, Question};
use crate::error::{AppError, AppResult};
use crate::script::to_traditional;

const JA_LABEL: &str = "例句（日文）";
const ZH_LABEL: &str = "例句（中文）";

#[derive(Deserialize)]
struct QuestionsDoc {
  #[serde(default)]
  questions: Vec<Question>,
}

/// Substring from the first `{` to the last `}` inclusive, across newlines.
pub fn extract_json_block(raw: &str) -> Option<&str> {
  let start = raw.find('{')?;
  let end = raw.rfind('}')?;
  if end < start {
    return None;
  }
  Some(&raw[start..=end])
}

/// Decode the `questions` array from raw model text. All-or-nothing.
pub fn parse_questions(raw: &str) -> AppResult<Vec<Question>> {
  let block = extract_json_block(raw).ok_or(AppError::NoJsonFound)?;
  let doc: QuestionsDoc = serde_json::from_str(block).map_err(|e| AppError::InvalidJson {
    message: e.to_string(),
    text: block.to_string(),
  })?;
  Ok(doc.questions)
}

/// Pull the Japanese/Chinese pair out of a generated example.
pub fn parse_example_sentence(raw: &str) -> ExampleSentence {
  let mut ja = String::new();
  let mut zh = String::new();
  for line in raw.lines() {
    if line.contains(JA_LABEL) {
      ja = strip_label(line, JA_LABEL);
    } else if line.contains(ZH_LABEL) {
      zh = strip_label(line, ZH_LABEL);
    }
  }
  let zh = to_traditional(&zh);
  ExampleSentence {
    raw: raw.to_string(),
    ja: (!ja.is_empty()).then_some(ja),
    zh: (!zh.is_empty()).then_some(zh),
    error: None,
  }
}

fn strip_label(line: &str, label: &str) -> String {
  line.replace(&format!("{label}："), "").trim().to_string()
}

/// Count of answers matching the key, position by position.
pub fn score(questions: &[Question], answers: &[String]) -> usize {
  questions
    .iter()
    .zip(answers)
    .filter(|(q, a)| **a == q.answer)
    .count()
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"はい、以下が問題です。
```json
{
  "questions": [
    {"question":"筆者はどこへ行きましたか。","options":["京都","大阪","東京","奈良"],"answer":"京都","explanation":"第一文に書いてある。"},
    {"question":"天気はどうでしたか。","options":["雨","晴れ","雪","曇り"],"answer":"晴れ","explanation":"「よく晴れた日」とある。"}
  ]
}
```
頑張ってください！"#;

  #[test]
  fn extracts_block_surrounded_by_prose() {
    let qs = parse_questions(SAMPLE).expect("questions");
    assert_eq!(qs.len(), 2);
    assert_eq!(qs[0].answer, "京都");
    assert_eq!(qs[1].options.len(), 4);
  }

  #[test]
  fn block_spans_first_open_to_last_close() {
    let raw = "x {\"a\": {\"b\": 1}} y";
    assert_eq!(extract_json_block(raw), Some("{\"a\": {\"b\": 1}}"));
  }

  #[test]
  fn missing_braces_is_no_json() {
    assert!(matches!(parse_questions("no json here"), Err(AppError::NoJsonFound)));
    assert!(matches!(parse_questions("} backwards {"), Err(AppError::NoJsonFound)));
  }

  #[test]
  fn invalid_json_fails_whole_parse() {
    let raw = r#"{"questions": [{"question": "q", "options": ["a"], "answer": "a"},]}"#;
    match parse_questions(raw) {
      Err(AppError::InvalidJson { text, .. }) => assert_eq!(text, raw),
      other => panic!("expected InvalidJson, got {other:?}"),
    }
  }

  #[test]
  fn two_objects_with_prose_between_is_invalid() {
    let raw = r#"{"questions": []} and also {"questions": []}"#;
    assert!(matches!(parse_questions(raw), Err(AppError::InvalidJson { .. })));
  }

  #[test]
  fn missing_questions_key_is_empty() {
    assert_eq!(parse_questions(r#"{"items": []}"#).unwrap(), vec![]);
  }

  #[test]
  fn parses_labelled_example_lines() {
    let raw = "例句（日文）：私は毎朝コーヒーを飲みます。\n例句（中文）：我每天早上喝咖啡。";
    let ex = parse_example_sentence(raw);
    assert_eq!(ex.ja.as_deref(), Some("私は毎朝コーヒーを飲みます。"));
    assert_eq!(ex.zh.as_deref(), Some("我每天早上喝咖啡。"));
    assert_eq!(ex.raw, raw);
  }

  #[test]
  fn chinese_line_is_converted_to_traditional() {
    let ex = parse_example_sentence("例句（中文）：这是学习语言的好方法。");
    assert_eq!(ex.zh.as_deref(), Some("這是學習語言的好方法。"));
    assert!(ex.ja.is_none());
  }

  #[test]
  fn unlabelled_output_yields_no_pair() {
    let ex = parse_example_sentence("Sorry, I can't do that.");
    assert!(ex.ja.is_none() && ex.zh.is_none());
  }

  #[test]
  fn score_counts_exact_matches() {
    let qs = parse_questions(SAMPLE).unwrap();
    assert_eq!(score(&qs, &["京都".to_string(), "晴れ".to_string()]), 2);
    assert_eq!(score(&qs, &["大阪".to_string(), "晴れ".to_string()]), 1);
    assert_eq!(score(&qs, &[String::new(), String::new()]), 0);
  }
}
