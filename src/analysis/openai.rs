// src/analysis/openai.rs
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::model::{LanguageModel, ModelResolver, ModelResponse, OutputSchema};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolves model names against an OpenAI-compatible `/models` endpoint.
pub struct OpenAiResolver {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl OpenAiResolver {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&base).with_context(|| format!("invalid LLM base url {}", base_url))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }
}

impl ModelResolver for OpenAiResolver {
    fn resolve(&self, model_name: &str) -> Result<Box<dyn LanguageModel>> {
        let Some(key) = self.api_key.as_deref() else {
            bail!("no API key configured for model {}", model_name);
        };
        let url = self.base.join(&format!("models/{}", model_name))?;
        debug!(%url, "resolving model");

        let resp = self.client.get(url).bearer_auth(key).send()?;
        let status = resp.status();
        if !status.is_success() {
            bail!("model {} not available (HTTP {})", model_name, status.as_u16());
        }

        Ok(Box::new(OpenAiModel {
            client: self.client.clone(),
            completions: self.base.join("chat/completions")?,
            api_key: key.to_string(),
            model: model_name.to_string(),
        }))
    }
}

pub struct OpenAiModel {
    client: Client,
    completions: Url,
    api_key: String,
    model: String,
}

impl OpenAiModel {
    fn request_body(&self, prompt: &str, schema: &OutputSchema, system: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.schema,
                }
            }),
        }
    }
}

impl LanguageModel for OpenAiModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn prompt(&self, prompt: &str, schema: &OutputSchema, system: &str) -> Result<ModelResponse> {
        let body = self.request_body(prompt, schema, system);
        let resp = self
            .client
            .post(self.completions.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            bail!("{} returned HTTP {}: {}", self.model, status.as_u16(), text);
        }

        let chat: ChatResponse = resp.json().context("decoding chat completion")?;
        into_model_response(chat)
    }
}

/// First choice's content as text, with `parsed_data` filled when that text
/// is already valid JSON.
fn into_model_response(chat: ChatResponse) -> Result<ModelResponse> {
    let message = chat
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| anyhow!("no choices in response"))?;

    if let Some(refusal) = message.refusal {
        bail!("model refused: {}", refusal);
    }

    let text = message.content.unwrap_or_default();
    let parsed_data = serde_json::from_str::<Value>(&text).ok();
    Ok(ModelResponse {
        text,
        schema_object: None,
        parsed_data,
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
