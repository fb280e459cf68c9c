//! Text-generator transports. Request shaping and reply parsing live in
//! `hlsf_core::llm`; this module only moves messages.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use hlsf_core::DEFAULT_SEED;
use hlsf_core::glyph::keyed_index;
use hlsf_core::llm::{ChatRequest, TASK_EXPANSIONS, TASK_GLYPHS, TASK_REFINE};
use serde_json::{Value, json};

use crate::config::LlmSettings;

pub enum Provider {
    /// Deterministic offline replies keyed on the task name.
    Mock,
    OpenAiCompat(OpenAiCompat),
}

pub struct OpenAiCompat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl Provider {
    /// `None` when generation is disabled, the provider name is unknown, or
    /// an `openai_compat` provider has no key to send.
    pub fn from_settings(llm: &LlmSettings) -> Result<Option<Self>> {
        if !llm.enabled {
            return Ok(None);
        }
        match llm.provider.to_ascii_lowercase().as_str() {
            "mock" => Ok(Some(Provider::Mock)),
            "openai_compat" | "openai-compatible" | "openai" => {
                if llm.api_key.is_empty() {
                    tracing::info!("no LLM_API_KEY set, running offline");
                    return Ok(None);
                }
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(llm.timeout_secs))
                    .build()
                    .context("failed to build HTTP client")?;
                Ok(Some(Provider::OpenAiCompat(OpenAiCompat {
                    client,
                    base_url: llm.base_url.trim_end_matches('/').to_string(),
                    model: llm.model.clone(),
                    api_key: llm.api_key.clone(),
                })))
            }
            other => {
                tracing::debug!(provider = other, "unknown provider, running offline");
                Ok(None)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Mock => "mock",
            Provider::OpenAiCompat(_) => "openai_compat",
        }
    }

    /// Assistant message content for `request`.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String> {
        match self {
            Provider::Mock => Ok(mock_reply(request)),
            Provider::OpenAiCompat(remote) => remote.chat(request).await,
        }
    }
}

impl OpenAiCompat {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("chat completion returned {status}: {text}");
        }

        let data: Value = response
            .json()
            .await
            .context("chat completion response is not JSON")?;
        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .context("chat completion response has no message content")
    }
}

fn mock_reply(request: &ChatRequest) -> String {
    let body = request.task_body().unwrap_or(Value::Null);
    let strings = |key: &str| -> Vec<String> {
        body.get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    };

    match body.get("task").and_then(Value::as_str) {
        Some(TASK_EXPANSIONS) => {
            let expansions: Vec<Value> = strings("tokens")
                .into_iter()
                .filter(|t| t.starts_with(|c: char| c.is_ascii_alphabetic()))
                .map(|token| {
                    let base = token.to_lowercase();
                    let semantic = if base.chars().count() > 2 {
                        base.clone()
                    } else {
                        format!("{base}_sem")
                    };
                    json!({
                        "token": token,
                        "semantic": {"text": semantic, "weight": 0.86},
                        "associative": {"text": format!("{base}_assoc"), "weight": 0.66},
                    })
                })
                .collect();
            json!({ "expansions": expansions }).to_string()
        }
        Some(TASK_GLYPHS) => {
            let bank_size = body
                .get("bank_size")
                .and_then(Value::as_u64)
                .unwrap_or(1000)
                .max(1) as usize;
            let seed = body.get("seed").and_then(Value::as_u64).unwrap_or(DEFAULT_SEED);
            let indices: Vec<Value> = strings("tokens")
                .into_iter()
                .map(|token| {
                    let index = keyed_index(&token, seed, bank_size);
                    json!({"token": token, "index": index})
                })
                .collect();
            json!({ "glyph_indices": indices }).to_string()
        }
        Some(TASK_REFINE) => {
            let previous = body
                .get("previous_answer")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            if previous.is_empty() {
                let prompt = body.get("prompt").and_then(Value::as_str).unwrap_or_default();
                format!("{} - concise answer (mock).", prompt.trim())
            } else {
                previous.to_string()
            }
        }
        _ => "OK".to_string(),
    }
}
