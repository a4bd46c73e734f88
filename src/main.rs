//! Dokkai · Japanese reading-comprehension trainer backend
//!
//! - Axum HTTP + WebSocket API
//! - Question/explanation generation via a hosted chat model
//! - JA → EN → ZH word translation with dictionary enrichment
//! - Score history in a flat JSON file
//!
//! Important env variables:
//!   PORT                    : u16 (default 3000)
//!   HF_TOKEN                : bearer token for the inference APIs (required for generation/translation)
//!   HF_BASE_URL             : chat completions base, default "https://router.huggingface.co/v1"
//!   HF_CHAT_MODEL           : default "Qwen/Qwen2.5-1.5B-Instruct"
//!   HF_TRANSLATE_JA_EN_URL  : JA → EN translation model endpoint
//!   HF_TRANSLATE_EN_ZH_URL  : EN → ZH translation model endpoint
//!   JISHO_BASE_URL          : default "https://jisho.org/api/v1"
//!   DICTIONARY_BASE_URL     : default "https://api.dictionaryapi.dev/api/v2"
//!   HISTORY_PATH            : default "score_history.json"
//!   HTTP_TIMEOUT_SECS       : upstream request timeout (default 60)
//!   APP_CONFIG_PATH         : path to TOML config (prompts + generation parameters)
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod script;
mod extract;
mod hf;
mod dictionary;
mod history;
mod state;
mod protocol;
mod logic;
mod routes;
#[cfg(test)]
mod test_support;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (sessions, inference client, dictionary, history).
  let state = Arc::new(AppState::new());

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "dokkai_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
