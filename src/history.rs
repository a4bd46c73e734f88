//! Score history persisted as one flat JSON array on disk.
//!
//! The file is read in full and rewritten in full on every save. Records are
//! only ever appended. Saves inside this process are serialised; there is no
//! cross-process locking.

use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::domain::HistoryRecord;
use crate::error::AppResult;

pub const DEFAULT_RECENT: usize = 10;

pub struct HistoryStore {
  path: PathBuf,
  write_lock: Mutex<()>,
}

impl HistoryStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write_lock: Mutex::new(()) }
  }

  #[cfg(test)]
  pub fn path(&self) -> &std::path::Path {
    &self.path
  }

  /// All records, oldest first. A missing file is an empty history.
  pub async fn load(&self) -> AppResult<Vec<HistoryRecord>> {
    match tokio::fs::read(&self.path).await {
      Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
      Err(e) => Err(e.into()),
    }
  }

  /// Append one record and rewrite the file.
  #[instrument(level = "info", skip(self, record), fields(path = %self.path.display(), score = record.score, total = record.total))]
  pub async fn append(&self, record: HistoryRecord) -> AppResult<usize> {
    let _guard = self.write_lock.lock().await;
    let mut history = self.load().await?;
    history.push(record);
    let json = serde_json::to_string_pretty(&history)?;
    tokio::fs::write(&self.path, json).await?;
    info!(target: "quiz", records = history.len(), "History saved");
    Ok(history.len())
  }

  /// The last `n` records, newest first.
  pub async fn recent(&self, n: usize) -> AppResult<Vec<HistoryRecord>> {
    let history = self.load().await?;
    Ok(history.into_iter().rev().take(n).collect())
  }
}

/// Local timestamp in the history file's format.
pub fn now_stamp() -> String {
  chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(score: usize) -> HistoryRecord {
    HistoryRecord {
      date: "2026-10-19 09:30:00".into(),
      score,
      total: 3,
      questions: vec!["Q1".into(), "Q2".into(), "Q3".into()],
      answers: vec!["東京".into(), String::new(), "雨".into()],
      correct_answers: vec!["東京".into(), "京都".into(), "晴れ".into()],
      explanations: vec!["e1".into(), "e2".into(), "e3".into()],
      article_explanation: Some("這篇文章在講旅行。".into()),
    }
  }

  #[tokio::test]
  async fn missing_file_is_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("score_history.json"));
    assert!(store.load().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn append_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("score_history.json"));
    assert_eq!(store.append(record(1)).await.unwrap(), 1);
    let mut no_explanation = record(3);
    no_explanation.article_explanation = None;
    assert_eq!(store.append(no_explanation.clone()).await.unwrap(), 2);

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded, vec![record(1), no_explanation]);
  }

  #[tokio::test]
  async fn file_is_pretty_json_array_with_raw_unicode() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("h.json"));
    store.append(record(2)).await.unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.starts_with('['));
    assert!(text.contains("\"correct_answers\""));
    assert!(text.contains("東京"));
    assert!(text.contains('\n'));
  }

  #[tokio::test]
  async fn recent_is_newest_first_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("h.json"));
    for s in 0..12 {
      store.append(record(s)).await.unwrap();
    }
    let recent = store.recent(DEFAULT_RECENT).await.unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].score, 11);
    assert_eq!(recent[9].score, 2);
  }

  #[tokio::test]
  async fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = HistoryStore::new(path);
    assert!(store.load().await.is_err());
    assert!(store.append(record(0)).await.is_err());
  }

  #[test]
  fn stamp_format() {
    let s = now_stamp();
    assert_eq!(s.len(), 19);
    assert_eq!(&s[4..5], "-");
    assert_eq!(&s[10..11], " ");
  }
}
