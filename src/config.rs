//! Settings read from the process environment (after `.env` is loaded).

use crate::error::TravelError;
use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com/search.json";
pub const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct AppConfig {
    /// Generative-language key. Without it no resolution or itinerary runs.
    pub genai_api_key: Option<String>,
    /// Flight-search key, passed through as-is; the upstream rejects a bad one.
    pub serpapi_api_key: Option<String>,
    pub model: String,
    pub serpapi_base_url: String,
    pub genai_base_url: String,
    /// Applied to every outbound HTTP call
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            genai_api_key: non_blank("GOOGLE_API_KEY"),
            serpapi_api_key: non_blank("SERPAPI_API_KEY"),
            model: non_blank("GENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            serpapi_base_url: non_blank("SERPAPI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SERPAPI_BASE_URL.to_string()),
            genai_base_url: non_blank("GENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GENAI_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                non_blank("HTTP_TIMEOUT_SECS")
                    .and_then(|secs| secs.trim().parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    pub fn require_genai_key(&self) -> Result<&str, TravelError> {
        self.genai_api_key
            .as_deref()
            .ok_or(TravelError::ConfigMissing)
    }

    /// Shared HTTP client carrying the configured timeout
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
    }
}

/// Mask the value of every `key=` / `api_key=` query parameter in `text`.
///
/// Upstream error messages can echo the request URL, which carries the keys.
pub fn redact_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("key=") {
        let (head, tail) = rest.split_at(pos + "key=".len());
        out.push_str(head);
        let end = tail
            .find(|c: char| c == '&' || c == ')' || c == '"' || c.is_whitespace())
            .unwrap_or(tail.len());
        if end > 0 {
            out.push_str("***");
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

// Keys never end up in logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("genai_api_key", &self.genai_api_key.as_ref().map(|_| "***"))
            .field("serpapi_api_key", &self.serpapi_api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("serpapi_base_url", &self.serpapi_base_url)
            .field("genai_base_url", &self.genai_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
