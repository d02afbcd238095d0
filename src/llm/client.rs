//! Completion backends.
//!
//! A backend takes a built prompt and returns the raw completion text. Exactly
//! one request is made per call; re-asking is left to the caller.

use crate::config::{LlmProvider, LlmSettings};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces a completion for a prompt.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send `prompt` and return the completion text.
    ///
    /// Fails with a translation error on transport errors, non-success
    /// statuses and blank completions.
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Build the backend selected in the settings.
pub fn from_settings(settings: &LlmSettings) -> AppResult<Arc<dyn CompletionBackend>> {
    let backend: Arc<dyn CompletionBackend> = match settings.provider {
        LlmProvider::Gemini => Arc::new(GeminiBackend::new(settings)?),
        LlmProvider::Openai => Arc::new(OpenAiBackend::new(settings)?),
    };
    debug!(
        backend = backend.name(),
        model = %settings.model,
        base_url = %settings.base_url,
        "Completion backend ready"
    );
    Ok(backend)
}

fn build_client(settings: &LlmSettings) -> AppResult<Client> {
    Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
}

/// POST `body` and return the decoded JSON response.
async fn post_json(request: reqwest::RequestBuilder, body: &Value) -> AppResult<Value> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| AppError::translation(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        warn!(status = %status, "Completion backend returned an error status");
        return Err(AppError::translation(format!(
            "backend returned {}: {}",
            status,
            text.trim()
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AppError::translation(format!("invalid response body: {}", e)))
}

/// Reject blank completions.
fn non_empty(text: Option<&str>) -> AppResult<String> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t.to_string()),
        Some(_) => Err(AppError::translation("backend returned an empty completion")),
        None => Err(AppError::translation(
            "backend response did not contain a completion",
        )),
    }
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Google Generative Language API (`generateContent`).
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: trim_base(&settings.base_url),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0 }
        });
        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key);
        let data = post_json(request, &body).await?;
        non_empty(data["candidates"][0]["content"]["parts"][0]["text"].as_str())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Any OpenAI-compatible chat completions endpoint.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: trim_base(&settings.base_url),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0
        });
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key));
        let data = post_json(request, &body).await?;
        non_empty(data["choices"][0]["message"]["content"].as_str())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(provider: LlmProvider, base_url: &str) -> LlmSettings {
        LlmSettings {
            provider,
            model: "test-model".to_string(),
            api_key: "key".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_gemini_endpoint() {
        let backend =
            GeminiBackend::new(&settings(LlmProvider::Gemini, "https://example.test/")).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_from_settings_picks_provider() {
        let backend = from_settings(&settings(LlmProvider::Openai, "http://localhost")).unwrap();
        assert_eq!(backend.name(), "openai");
        let backend = from_settings(&settings(LlmProvider::Gemini, "http://localhost")).unwrap();
        assert_eq!(backend.name(), "gemini");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("SELECT 1")).unwrap(), "SELECT 1");
        assert!(matches!(
            non_empty(Some("  \n")),
            Err(AppError::Translation { .. })
        ));
        assert!(non_empty(None).is_err());
    }
}
