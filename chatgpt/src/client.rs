use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use slide_common::{DeckGenerator, Slide};
use std::time::Duration;

use crate::api_log::{ApiExchange, ApiLog};
use crate::error::GenerationError;
use crate::parse::{clean_keywords, extract_deck};
use crate::prompts::{deck_prompt, keywords_prompt};

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    pub model: String,
    pub language: String,
    pub deck_temperature: f64,
    pub keyword_temperature: f64,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.mistral.ai/v1".to_string(),
            model: "mistral-large-latest".to_string(),
            language: "en".to_string(),
            deck_temperature: 0.7,
            keyword_temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Non-streaming chat completions client.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_key: String,
    settings: ChatSettings,
    log: ApiLog,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String, settings: ChatSettings) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            api_key,
            settings,
            log: ApiLog::new(),
        })
    }

    /// Every exchange made by this client, newest first.
    pub fn log(&self) -> &ApiLog {
        &self.log
    }

    pub async fn generate_presentation(&self, topic: &str) -> Result<Vec<Slide>, GenerationError> {
        let prompt = deck_prompt(topic, &self.settings.language);
        let reply = self.complete(prompt, self.settings.deck_temperature).await?;
        let slides = extract_deck(&reply)?;
        tracing::info!("Model produced {} slides", slides.len());
        Ok(slides)
    }

    pub async fn generate_keywords(&self, slide_text: &str) -> Result<String, GenerationError> {
        let prompt = keywords_prompt(slide_text, &self.settings.language);
        let reply = self.complete(prompt, self.settings.keyword_temperature).await?;
        Ok(clean_keywords(&reply))
    }

    async fn complete(&self, prompt: String, temperature: f64) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });
        tracing::debug!(
            "Request Body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let mut exchange = ApiExchange {
            timestamp: Utc::now(),
            request: body.clone(),
            response: None,
            error: None,
        };

        let result = self.send(&body).await;
        match &result {
            Ok(raw) => exchange.response = Some(raw.clone()),
            Err(e) => exchange.error = Some(e.to_string()),
        }
        self.log.push(exchange);

        let raw = result.inspect_err(|e| tracing::warn!("Model API error: {e}"))?;
        let parsed: ChatResponse =
            serde_json::from_value(raw).map_err(|e| GenerationError::Parse {
                reason: e.to_string(),
            })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }

    async fn send(&self, body: &serde_json::Value) -> Result<serde_json::Value, GenerationError> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!("Response Status: {status}");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl DeckGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<Vec<Slide>> {
        Ok(self.generate_presentation(prompt).await?)
    }

    async fn keywords_for_image(&self, slide_text: &str) -> anyhow::Result<String> {
        Ok(self.generate_keywords(slide_text).await?)
    }
}
