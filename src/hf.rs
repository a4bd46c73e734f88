//! Minimal client for the hosted inference APIs we use.
//!
//! Two contracts:
//! - chat completions (OpenAI-compatible router) for questions, explanations and examples
//! - translation models (`[{"translation_text": ...}]`) for the JA → EN → ZH chain
//!
//! Calls are instrumented and log model names, latencies and response sizes.
//! The bearer token is never logged.

use std::time::Instant;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::util::trunc_for_log;

const UA: &str = "dokkai-backend/0.1";

/// Language tags for translation models that need them (mbart-50).
#[derive(Clone, Copy, Debug)]
pub struct LangPair {
  pub src: &'static str,
  pub tgt: &'static str,
}

pub const JA_TO_EN: LangPair = LangPair { src: "ja_XX", tgt: "en_XX" };

#[derive(Clone)]
pub struct HfClient {
  client: reqwest::Client,
  token: String,
  pub base_url: String,
  pub chat_model: String,
  pub ja_en_url: String,
  pub en_zh_url: String,
}

impl HfClient {
  /// Construct the client if a token is configured; otherwise return None.
  pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Option<Self> {
    let token = settings.hf_token.clone()?;
    Some(Self {
      client,
      token,
      base_url: settings.hf_base_url.trim_end_matches('/').to_string(),
      chat_model: settings.chat_model.clone(),
      ja_en_url: settings.ja_en_url.clone(),
      en_zh_url: settings.en_zh_url.clone(),
    })
  }

  /// Single-turn chat completion. Returns the first choice's text, trimmed.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.chat_model, prompt_len = prompt.len()))]
  pub async fn chat(&self, prompt: &str, max_tokens: u32, temperature: f32) -> AppResult<String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: &self.chat_model,
      messages: vec![ChatMessageReq { role: "user", content: prompt }],
      max_tokens,
      temperature,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.token))
      .json(&req).send().await?;

    if !res.status().is_success() {
      return Err(upstream_error(res).await);
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Chat usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| AppError::MalformedResponse("chat response has no choices".into()))?
      .trim()
      .to_string();

    info!(elapsed = ?start.elapsed(), out_len = text.len(), "Chat completion received");
    debug!(preview = %trunc_for_log(&text, 80), "Chat output");
    Ok(text)
  }

  /// One translation hop. Any non-200 aborts.
  #[instrument(level = "info", skip(self, text), fields(%url, text_len = text.len(), tagged = langs.is_some()))]
  pub async fn translate(&self, url: &str, text: &str, langs: Option<LangPair>) -> AppResult<String> {
    let mut parameters = serde_json::Map::new();
    if let Some(LangPair { src, tgt }) = langs {
      parameters.insert("src_lang".into(), src.into());
      parameters.insert("tgt_lang".into(), tgt.into());
    }
    let req = TranslationRequest {
      inputs: text,
      parameters,
      options: TranslationOptions { wait_for_model: true },
    };

    let start = Instant::now();
    let res = self.client.post(url)
      .header(USER_AGENT, UA)
      .header(AUTHORIZATION, format!("Bearer {}", self.token))
      .json(&req).send().await?;

    if res.status() != reqwest::StatusCode::OK {
      return Err(upstream_error(res).await);
    }

    let body: Vec<TranslationResponse> = res.json().await?;
    let out = body.into_iter().next()
      .and_then(|t| t.translation_text)
      .ok_or_else(|| AppError::MalformedResponse("missing translation_text".into()))?;

    info!(elapsed = ?start.elapsed(), out_len = out.len(), "Translation received");
    Ok(out)
  }

  /// Japanese → English, tagged for mbart.
  pub async fn ja_to_en(&self, text: &str) -> AppResult<String> {
    self.translate(&self.ja_en_url, text, Some(JA_TO_EN)).await
  }

  /// English → Chinese (Simplified). opus-mt needs no tags.
  pub async fn en_to_zh(&self, text: &str) -> AppResult<String> {
    self.translate(&self.en_zh_url, text, None).await
  }
}

async fn upstream_error(res: reqwest::Response) -> AppError {
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let message = extract_api_error(&body).unwrap_or(body);
  AppError::Upstream { status, message }
}

/// Try to pull a clean message out of an error body.
/// Handles both `{"error": {"message": ...}}` and `{"error": "..."}`.
fn extract_api_error(body: &str) -> Option<String> {
  let v: serde_json::Value = serde_json::from_str(body).ok()?;
  let err = v.get("error")?;
  err.get("message")
    .and_then(|m| m.as_str())
    .or_else(|| err.as_str())
    .map(str::to_string)
}

// --- DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessageReq<'a>>,
  max_tokens: u32,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq<'a> { role: &'a str, content: &'a str }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Serialize)]
struct TranslationRequest<'a> {
  inputs: &'a str,
  parameters: serde_json::Map<String, serde_json::Value>,
  options: TranslationOptions,
}
#[derive(Serialize)]
struct TranslationOptions { wait_for_model: bool }

#[derive(Deserialize)]
struct TranslationResponse {
  #[serde(default)] translation_text: Option<String>,
}
