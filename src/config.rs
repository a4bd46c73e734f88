//! Runtime settings from the environment, plus optional prompt overrides from TOML.
//!
//! See `Settings`, `AppConfig` and `Prompts` for the expected schema.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_HF_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_CHAT_MODEL: &str = "Qwen/Qwen2.5-1.5B-Instruct";
pub const DEFAULT_JA_EN_URL: &str =
  "https://api-inference.huggingface.co/models/facebook/mbart-large-50-many-to-many-mmt";
pub const DEFAULT_EN_ZH_URL: &str =
  "https://api-inference.huggingface.co/models/Helsinki-NLP/opus-mt-en-zh";
pub const DEFAULT_JISHO_BASE_URL: &str = "https://jisho.org/api/v1";
pub const DEFAULT_DICTIONARY_BASE_URL: &str = "https://api.dictionaryapi.dev/api/v2";
pub const DEFAULT_HISTORY_PATH: &str = "score_history.json";

/// Endpoints, credentials and paths. Everything has a default except the token.
#[derive(Clone, Debug)]
pub struct Settings {
  pub hf_token: Option<String>,
  pub hf_base_url: String,
  pub chat_model: String,
  pub ja_en_url: String,
  pub en_zh_url: String,
  pub jisho_base_url: String,
  pub dictionary_base_url: String,
  pub history_path: PathBuf,
  pub http_timeout_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      hf_token: None,
      hf_base_url: DEFAULT_HF_BASE_URL.into(),
      chat_model: DEFAULT_CHAT_MODEL.into(),
      ja_en_url: DEFAULT_JA_EN_URL.into(),
      en_zh_url: DEFAULT_EN_ZH_URL.into(),
      jisho_base_url: DEFAULT_JISHO_BASE_URL.into(),
      dictionary_base_url: DEFAULT_DICTIONARY_BASE_URL.into(),
      history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
      http_timeout_secs: 60,
    }
  }
}

impl Settings {
  pub fn from_env() -> Self {
    let d = Self::default();
    let var = |k: &str, dflt: String| std::env::var(k).ok().filter(|v| !v.is_empty()).unwrap_or(dflt);
    Self {
      hf_token: std::env::var("HF_TOKEN").ok().filter(|v| !v.is_empty()),
      hf_base_url: var("HF_BASE_URL", d.hf_base_url),
      chat_model: var("HF_CHAT_MODEL", d.chat_model),
      ja_en_url: var("HF_TRANSLATE_JA_EN_URL", d.ja_en_url),
      en_zh_url: var("HF_TRANSLATE_EN_ZH_URL", d.en_zh_url),
      jisho_base_url: var("JISHO_BASE_URL", d.jisho_base_url),
      dictionary_base_url: var("DICTIONARY_BASE_URL", d.dictionary_base_url),
      history_path: std::env::var("HISTORY_PATH").map(PathBuf::from).unwrap_or(d.history_path),
      http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(d.http_timeout_secs),
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: Generation,
}

/// Token budgets and sampling temperature for each chat call.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Generation {
  pub questions_max_tokens: u32,
  pub explanation_max_tokens: u32,
  pub example_max_tokens: u32,
  pub temperature: f32,
}

impl Default for Generation {
  fn default() -> Self {
    Self {
      questions_max_tokens: 1000,
      explanation_max_tokens: 800,
      example_max_tokens: 200,
      temperature: 0.7,
    }
  }
}

/// Prompt templates. `{article}` and `{word}` are substituted at call time.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub questions_template: String,
  pub explanation_template: String,
  pub example_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      questions_template: concat!(
        "あなたは日本語の先生です。以下の文章の理解力を試す質問を3問作成してください。",
        "質問内容は文章内の情報のみを使うようにしてください。",
        "それぞれの質問に対する答えは1つだけになるようにしてください。\n",
        "出力は必ず以下のJSON形式のみで返答してください：\n",
        "{\n",
        "  \"questions\": [\n",
        "    {\"question\":\"...\", \"options\":[\"...\",\"...\",\"...\",\"...\"], \"answer\":\"...\", \"explanation\":\"...\"},\n",
        "    ... 合計3問 ...\n",
        "  ]\n",
        "}\n\n",
        "文章：{article}",
      )
      .into(),
      explanation_template: concat!(
        "你是一位擅長語言教學的專家，請用繁體中文詳細解釋以下日文文章的內容，包括：\n",
        "1. 文章主旨是什麼？\n",
        "2. 有哪些重要語法？\n",
        "3. 文章中的關鍵詞彙有哪些意思？\n",
        "4. 如果有難句，如何理解？\n\n",
        "日文文章如下：{article}",
      )
      .into(),
      example_template: concat!(
        "請用單詞 '{word}' 造一個簡單的日文例句，並附上中文翻譯，格式如下：\n",
        "例句（日文）：...\n",
        "例句（中文）：...",
      )
      .into(),
    }
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "dokkai_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "dokkai_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "dokkai_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_other_defaults() {
    let cfg: AppConfig = toml::from_str(
      r#"
        [prompts]
        example_template = "Use {word} in a sentence."

        [generation]
        temperature = 0.2
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.example_template, "Use {word} in a sentence.");
    assert!(cfg.prompts.questions_template.contains("{article}"));
    assert_eq!(cfg.generation.temperature, 0.2);
    assert_eq!(cfg.generation.questions_max_tokens, 1000);
  }

  #[test]
  fn default_prompts_carry_placeholders() {
    let p = Prompts::default();
    assert!(p.questions_template.contains("\"questions\""));
    assert!(p.explanation_template.ends_with("{article}"));
    assert!(p.example_template.contains("例句（日文）"));
  }
}
