//! Recursive input sanitization.
//!
//! Strings lose markup tags, then every configured dangerous character,
//! then surrounding whitespace. Arrays and object values are cleaned
//! depth-first; object keys and non-string scalars pass through.
//! The result is a fixed point: sanitizing twice changes nothing.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::config::SanitizerConfig;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("tag pattern is a valid regex"));

/// Cleans free-form input before it reaches validation.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    strip: Vec<char>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::from_config(&SanitizerConfig::default())
    }
}

impl Sanitizer {
    pub fn new(strip_chars: &str) -> Self {
        let mut strip: Vec<char> = strip_chars.chars().collect();
        // once tags are gone a stray bracket can only start a new one
        strip.extend(['<', '>']);
        strip.sort_unstable();
        strip.dedup();
        Self { strip }
    }

    pub fn from_config(config: &SanitizerConfig) -> Self {
        Self::new(&config.strip_chars)
    }

    pub fn sanitize(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.sanitize_str(&s)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.sanitize(item)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, self.sanitize(item)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Like [`sanitize`](Self::sanitize), but top-level string fields named in
    /// `raw` are passed through untouched. Only for secrets that are hashed
    /// and never rendered, such as passwords.
    pub fn sanitize_except(&self, value: Value, raw: &[&str]) -> Value {
        match value {
            Value::Object(map) if !raw.is_empty() => Value::Object(
                map.into_iter()
                    .map(|(key, item)| {
                        let keep = raw.contains(&key.as_str()) && item.is_string();
                        let item = if keep { item } else { self.sanitize(item) };
                        (key, item)
                    })
                    .collect(),
            ),
            other => self.sanitize(other),
        }
    }

    pub fn sanitize_str(&self, input: &str) -> String {
        let without_tags = TAG.replace_all(input, "");
        let cleaned: String = without_tags
            .chars()
            .filter(|c| self.strip.binary_search(c).is_err())
            .collect();
        cleaned.trim().to_string()
    }
}
