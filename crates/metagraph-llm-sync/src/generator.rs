//! Text generation boundary.
//!
//! A `TextGenerator` performs exactly one attempt; retrying is the caller's
//! job (see `retry`). The Ollama implementation speaks the native
//! `/api/generate` endpoint with JSON-format enforcement: the reply is an
//! envelope whose `response` field is itself a JSON document.

use serde_json::Value;

use crate::LlmError;

pub trait TextGenerator {
    /// Send `prompt` once and return the decoded JSON record.
    fn generate_json(&self, prompt: &str) -> Result<Value, LlmError>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for &G {
    fn generate_json(&self, prompt: &str) -> Result<Value, LlmError> {
        (**self).generate_json(prompt)
    }
}

pub const GENERATE_PATH: &str = "/api/generate";

/// Decode an `/api/generate` reply body: parse the envelope, then parse the
/// string held in its `response` field.
pub fn decode_envelope(body: &str) -> Result<Value, LlmError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedJson(format!("envelope: {e}")))?;
    let text = envelope
        .get("response")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    serde_json::from_str(text).map_err(|e| LlmError::MalformedJson(e.to_string()))
}

#[cfg(feature = "ollama")]
pub use ollama::OllamaGenerator;

#[cfg(feature = "ollama")]
mod ollama {
    use reqwest::blocking::Client;
    use serde_json::{json, Value};
    use tracing::debug;

    use super::{decode_envelope, TextGenerator, GENERATE_PATH};
    use crate::{LlmConfig, LlmError};

    /// Local Ollama server, called synchronously.
    pub struct OllamaGenerator {
        client: Client,
        url: String,
        model: String,
    }

    impl OllamaGenerator {
        pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
            let client = Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| LlmError::Client(e.to_string()))?;
            Ok(Self {
                client,
                url: format!("{}{GENERATE_PATH}", config.host),
                model: config.model.clone(),
            })
        }

        pub fn url(&self) -> &str {
            &self.url
        }

        pub fn request_body(&self, prompt: &str) -> Value {
            json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "format": "json",
            })
        }
    }

    impl TextGenerator for OllamaGenerator {
        fn generate_json(&self, prompt: &str) -> Result<Value, LlmError> {
            debug!(url = %self.url, model = %self.model, "calling ollama");
            let response = self
                .client
                .post(&self.url)
                .json(&self.request_body(prompt))
                .send()
                .map_err(|e| LlmError::Transport {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            let body = response.text().map_err(|e| LlmError::Transport {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
            if !status.is_success() {
                return Err(LlmError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            decode_envelope(&body)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn request_targets_generate_endpoint() {
            let config = LlmConfig {
                host: "http://127.0.0.1:11434".to_string(),
                model: "llama3.2".to_string(),
                ..LlmConfig::default()
            };
            let generator = OllamaGenerator::new(&config).unwrap();
            assert_eq!(generator.url(), "http://127.0.0.1:11434/api/generate");

            let body = generator.request_body("hello");
            assert_eq!(body["model"], "llama3.2");
            assert_eq!(body["prompt"], "hello");
            assert_eq!(body["stream"], false);
            assert_eq!(body["format"], "json");
        }
    }
}
