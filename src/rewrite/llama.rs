use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::app::{PipelineError, Result};
use crate::rewrite::prompt::END_OF_TURN;
use crate::rewrite::{Completion, RewriteConfig};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Client for the `/completion` endpoint of a llama.cpp server.
pub struct LlamaClient {
    client: Client,
    config: RewriteConfig,
}

impl LlamaClient {
    pub fn new(config: RewriteConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!("{}/completion", self.config.endpoint.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "prompt": prompt,
            "n_predict": self.config.max_tokens,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "repeat_penalty": self.config.repeat_penalty,
            "mirostat": 0,
            "stop": [END_OF_TURN],
            "stream": false,
        })
    }
}

#[async_trait]
impl Completion for LlamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url())
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(PipelineError::Inference(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                self.url(),
                snippet
            )));
        }

        let parsed: CompletionResponse = response.json().await?;
        Ok(parsed.content)
    }
}
