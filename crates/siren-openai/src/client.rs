use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use siren_core::{Result, SirenError, SummarizeRequest, SummarizeResponse, Summarizer};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SYSTEM_PROMPT: &str = "You are an AI assistant tasked with summarizing an employee's \
medical history and current location for emergency response. Provide a concise summary, \
highlighting critical information such as allergies, medications, and any pre-existing \
conditions. Include the employee's current location in the summary.";

/// OpenAI summarizer
///
/// # Example
///
/// ```ignore
/// use siren_openai::OpenAiSummarizer;
///
/// let summarizer = OpenAiSummarizer::from_env()?;
/// // or
/// let summarizer = OpenAiSummarizer::new("your-api-key");
/// // or with custom endpoint
/// let summarizer = OpenAiSummarizer::new("key").with_base_url("https://api.example.com/v1/chat/completions");
/// ```
#[derive(Clone)]
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiSummarizer {
    /// Create a new summarizer with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create a new summarizer from environment variables.
    ///
    /// Reads OPENAI_API_KEY (required), SUMMARIZER_MODEL and
    /// SUMMARIZER_TIMEOUT_SECS (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| SirenError::summarizer("OPENAI_API_KEY environment variable not set"))?;

        let mut summarizer = Self::new(api_key);
        if let Ok(model) = std::env::var("SUMMARIZER_MODEL") {
            summarizer.model = model;
        }
        if let Some(secs) = std::env::var("SUMMARIZER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            summarizer.timeout = Duration::from_secs(secs);
        }
        Ok(summarizer)
    }

    /// Use a custom API URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn call(&self, request: &SummarizeRequest) -> Result<SummarizeResponse> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Medical History: {}\nCurrent Location: {}",
                        request.medical_history, request.current_location
                    ),
                },
            ],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SirenError::summarizer(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SirenError::summarizer(format!(
                "API returned {status}: {text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SirenError::summarizer(format!("invalid response body: {e}")))?;

        let summary = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| SirenError::summarizer("empty completion"))?;

        Ok(SummarizeResponse { summary })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, request: SummarizeRequest) -> Result<SummarizeResponse> {
        tracing::debug!(model = %self.model, "requesting medical summary");

        match tokio::time::timeout(self.timeout, self.call(&request)).await {
            Ok(result) => result,
            Err(_) => Err(SirenError::SummarizerTimeout(self.timeout.as_secs())),
        }
    }
}

impl std::fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// Minimal response shape; everything else in the payload is ignored
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let summarizer = OpenAiSummarizer::new("sk-secret");
        let debug = format!("{summarizer:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn response_parsing() {
        let raw = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Severe penicillin allergy. At Delta Wing." } }
            ],
            "usage": { "total_tokens": 42 }
        });
        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content,
            "Severe penicillin allergy. At Delta Wing."
        );
    }

    #[tokio::test]
    async fn timeout_surfaces_as_distinct_error() {
        // Unroutable address; the 0-second deadline fires before any I/O
        let summarizer = OpenAiSummarizer::new("key")
            .with_base_url("http://192.0.2.1:9/v1/chat/completions")
            .with_timeout(Duration::from_secs(0));

        let err = summarizer
            .summarize(SummarizeRequest {
                medical_history: "Allergies: none recorded.".to_string(),
                current_location: "Lat: 0, Lon: 0".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SirenError::SummarizerTimeout(0)));
    }
}
