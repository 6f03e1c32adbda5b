//! Generative-language API access.
//!
//! Everything that needs a model goes through [`TextGenerator`], so the
//! airport resolver and itinerary generator never touch a concrete client.

use crate::config::{AppConfig, redact_keys};
use crate::error::TravelError;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::gemini;
use rig::providers::gemini::completion::CompletionModel;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

const PREAMBLE: &str = "You are a helpful travel assistant.";

pub trait TextGenerator {
    /// Send one prompt and return the raw generated text
    async fn generate(&self, prompt: &str) -> Result<String, TravelError>;
}

pub struct GeminiGenerator {
    agent: Agent<CompletionModel>,
    model: String,
    timeout: Duration,
}

impl GeminiGenerator {
    /// Fails with `ConfigMissing` when no generative key is configured
    pub fn from_config(config: &AppConfig) -> Result<Self, TravelError> {
        let api_key = config.require_genai_key()?;
        let client = gemini::Client::new(api_key);
        let agent = client.agent(&config.model).preamble(PREAMBLE).build();
        Ok(Self {
            agent,
            model: config.model.clone(),
            timeout: config.request_timeout,
        })
    }
}

impl TextGenerator for GeminiGenerator {
    #[instrument(name = "genai_generate", skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, TravelError> {
        debug!("Sending prompt of {} bytes", prompt.len());
        let request = async { self.agent.prompt(prompt).await };
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                TravelError::GenerationFailure(format!("no reply within {:?}", self.timeout))
            })?
            .map_err(|e| model_failure(&e))?;
        info!("Received {} bytes from model", response.len());
        Ok(response)
    }
}

// The Gemini client puts the key in its request URLs, which its errors echo.
fn model_failure(error: &impl std::fmt::Display) -> TravelError {
    TravelError::GenerationFailure(redact_keys(&error.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelPage {
    #[serde(default)]
    models: Vec<ModelEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

/// Names of all models visible to the configured key
#[instrument(skip(http, config))]
pub async fn list_models(
    http: &reqwest::Client,
    config: &AppConfig,
) -> Result<Vec<String>, TravelError> {
    let api_key = config.require_genai_key()?;
    let url = format!("{}/v1beta/models", config.genai_base_url.trim_end_matches('/'));
    let mut names = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let mut query = vec![("key", api_key.to_string())];
        if let Some(token) = page_token.take() {
            query.push(("pageToken", token));
        }
        let response = http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| TravelError::GenerationFailure(e.without_url().to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TravelError::GenerationFailure(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(TravelError::GenerationFailure(format!(
                "Status: {}, Response: {}",
                status,
                redact_keys(&text)
            )));
        }
        let page = parse_model_page(&text)?;
        names.extend(page.models.into_iter().map(|m| m.name));
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }
    info!("Listed {} models", names.len());
    Ok(names)
}

fn parse_model_page(text: &str) -> Result<ModelPage, TravelError> {
    serde_json::from_str(text).map_err(|e| TravelError::GenerationFailure(e.to_string()))
}
