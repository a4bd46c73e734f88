//! Application state: session store, prompts, inference client, dictionary and history.
//!
//! Sessions are explicit contexts keyed by id. Locks are only held for the
//! duration of a read or a mutation, never across an upstream call.

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{load_app_config_from_env, AppConfig, Generation, Prompts, Settings};
use crate::dictionary::Dictionary;
use crate::domain::Session;
use crate::error::{AppError, AppResult};
use crate::hf::HfClient;
use crate::history::HistoryStore;

pub struct AppState {
  pub sessions: Arc<RwLock<HashMap<String, Session>>>,
  pub hf: Option<HfClient>,
  pub dictionary: Dictionary,
  pub history: HistoryStore,
  pub prompts: Prompts,
  pub generation: Generation,
}

impl AppState {
  /// Build state from env: settings, optional TOML overrides, shared HTTP client.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let settings = Settings::from_env();
    let cfg = load_app_config_from_env().unwrap_or_default();
    Self::from_parts(&settings, cfg)
  }

  pub fn from_parts(settings: &Settings, cfg: AppConfig) -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.http_timeout_secs))
      .build()
      .unwrap_or_else(|_| reqwest::Client::new());

    let hf = HfClient::from_settings(settings, client.clone());
    if let Some(hf) = &hf {
      info!(target: "dokkai_backend", base_url = %hf.base_url, chat_model = %hf.chat_model, ja_en = %hf.ja_en_url, en_zh = %hf.en_zh_url, "Inference API enabled.");
    } else {
      info!(target: "dokkai_backend", "Inference API disabled (no HF_TOKEN). Question generation and translation will fail.");
    }
    info!(target: "dokkai_backend", history = %settings.history_path.display(), "History file");

    Self {
      sessions: Arc::new(RwLock::new(HashMap::new())),
      hf,
      dictionary: Dictionary::new(settings, client),
      history: HistoryStore::new(settings.history_path.clone()),
      prompts: cfg.prompts,
      generation: cfg.generation,
    }
  }

  pub fn hf(&self) -> AppResult<&HfClient> {
    self.hf.as_ref().ok_or(AppError::ModelUnavailable)
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn create_session(&self) -> String {
    let id = Uuid::new_v4().to_string();
    self.sessions.write().await.insert(id.clone(), Session::default());
    info!(target: "quiz", session = %id, "Session created");
    id
  }

  /// Snapshot of a session.
  pub async fn session(&self, id: &str) -> AppResult<Session> {
    self.sessions.read().await
      .get(id)
      .cloned()
      .ok_or_else(|| AppError::NotFound(format!("unknown session: {id}")))
  }

  /// Run `f` against the session under the write lock.
  pub async fn with_session<R>(
    &self,
    id: &str,
    f: impl FnOnce(&mut Session) -> AppResult<R>,
  ) -> AppResult<R> {
    let mut sessions = self.sessions.write().await;
    let session = sessions
      .get_mut(id)
      .ok_or_else(|| AppError::NotFound(format!("unknown session: {id}")))?;
    f(session)
  }
}
