//! Public dictionary lookups: Jisho for Japanese headwords, dictionaryapi.dev for English.
//!
//! Both APIs are unauthenticated. A non-200 status or an empty result means
//! "no entry" rather than an error; only transport and decode failures propagate.

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::{EnglishEntry, WordInfo};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct Dictionary {
  client: reqwest::Client,
  pub jisho_base_url: String,
  pub dictionary_base_url: String,
}

impl Dictionary {
  pub fn new(settings: &Settings, client: reqwest::Client) -> Self {
    Self {
      client,
      jisho_base_url: settings.jisho_base_url.trim_end_matches('/').to_string(),
      dictionary_base_url: settings.dictionary_base_url.trim_end_matches('/').to_string(),
    }
  }

  /// First Jisho entry for `word`, reduced to its first form and first sense.
  #[instrument(level = "info", skip(self), fields(%word))]
  pub async fn lookup_japanese(&self, word: &str) -> AppResult<Option<WordInfo>> {
    let url = format!("{}/search/words", self.jisho_base_url);
    let res = self.client.get(&url)
      .header(USER_AGENT, "dokkai-backend/0.1")
      .query(&[("keyword", word)])
      .send().await?;
    if res.status() != reqwest::StatusCode::OK {
      debug!(status = %res.status(), "Jisho lookup returned non-200");
      return Ok(None);
    }

    let body: JishoResponse = res.json().await?;
    let Some(entry) = body.data.into_iter().next() else {
      return Ok(None);
    };
    let form = entry.japanese.into_iter().next().unwrap_or_default();
    let sense = entry.senses.into_iter().next().unwrap_or_default();
    let example_sentence = entry.sentences.into_iter().next()
      .and_then(|s| s.ja)
      .unwrap_or_default();

    Ok(Some(WordInfo {
      word: form.word.unwrap_or_default(),
      reading: form.reading.unwrap_or_default(),
      part_of_speech: sense.parts_of_speech,
      english_definitions: sense.english_definitions,
      example_sentence,
    }))
  }

  /// First meaning and definition of an English word.
  #[instrument(level = "info", skip(self), fields(%word))]
  pub async fn lookup_english(&self, word: &str) -> AppResult<Option<EnglishEntry>> {
    let mut url = reqwest::Url::parse(&format!("{}/entries/en", self.dictionary_base_url))
      .map_err(|e| AppError::Config(format!("invalid DICTIONARY_BASE_URL: {e}")))?;
    url.path_segments_mut()
      .map_err(|_| AppError::Config("DICTIONARY_BASE_URL cannot be a base".into()))?
      .push(word);

    let res = self.client.get(url)
      .header(USER_AGENT, "dokkai-backend/0.1")
      .send().await?;
    if res.status() != reqwest::StatusCode::OK {
      debug!(status = %res.status(), "Dictionary lookup returned non-200");
      return Ok(None);
    }

    let body: Vec<DictEntry> = res.json().await?;
    let entry = body.into_iter().next()
      .and_then(|e| e.meanings.into_iter().next())
      .and_then(|m| {
        let d = m.definitions.into_iter().next()?;
        Some(EnglishEntry {
          part_of_speech: m.part_of_speech,
          definition: d.definition,
          example: d.example.unwrap_or_default(),
        })
      });
    Ok(entry)
  }
}

// --- Jisho DTOs ---

#[derive(Deserialize)]
struct JishoResponse {
  #[serde(default)] data: Vec<JishoEntry>,
}
#[derive(Deserialize)]
struct JishoEntry {
  #[serde(default)] japanese: Vec<JishoForm>,
  #[serde(default)] senses: Vec<JishoSense>,
  #[serde(default)] sentences: Vec<JishoSentence>,
}
#[derive(Deserialize, Default)]
struct JishoForm {
  #[serde(default)] word: Option<String>,
  #[serde(default)] reading: Option<String>,
}
#[derive(Deserialize, Default)]
struct JishoSense {
  #[serde(default)] parts_of_speech: Vec<String>,
  #[serde(default)] english_definitions: Vec<String>,
}
#[derive(Deserialize)]
struct JishoSentence {
  #[serde(default)] ja: Option<String>,
}

// --- dictionaryapi.dev DTOs ---

#[derive(Deserialize)]
struct DictEntry {
  #[serde(default)] meanings: Vec<DictMeaning>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DictMeaning {
  #[serde(default)] part_of_speech: String,
  #[serde(default)] definitions: Vec<DictDefinition>,
}
#[derive(Deserialize)]
struct DictDefinition {
  definition: String,
  #[serde(default)] example: Option<String>,
}
