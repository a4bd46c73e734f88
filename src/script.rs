//! Simplified → Traditional Chinese script conversion.
//!
//! Both translation output and model-written Chinese explanations come back in
//! Simplified script; the learner reads Traditional.
use zhconv::{zhconv, Variant};

/// Convert Simplified Chinese to Traditional. Non-Chinese text passes through unchanged.
pub fn to_traditional(text: &str) -> String {
  if text.is_empty() {
    return String::new();
  }
  zhconv(text, Variant::ZhHant)
}
