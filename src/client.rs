use crate::{
    error::{FlowError, Result},
    parse::strip_think_tags,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

/// Configuration for text-generation requests.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Custom options merged into the Ollama options object.
    pub options: Option<Value>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            options: None,
        }
    }
}

impl LlmConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// The injected text-generation dependency.
///
/// Stage handlers receive this instead of constructing clients themselves,
/// so a whole workflow shares one client and tests can substitute canned
/// responses. Every call is a blocking round trip from the caller's point
/// of view; the streaming variant delivers fragments in arrival order and
/// returns the full concatenation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One-shot completion for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Completion with a system message framing the user prompt.
    async fn chat(&self, system: &str, user: &str) -> Result<String>;

    /// Streaming completion; `on_token` sees each fragment as it arrives.
    async fn generate_streaming(
        &self,
        prompt: &str,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String>;
}

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    config: LlmConfig,
}

impl OllamaClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            config: LlmConfig::default(),
        }
    }

    /// Build a client from `OLLAMA_HOST` / `OLLAMA_MODEL`, with the usual
    /// local defaults.
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2:latest".to_string());
        Self::new(endpoint, model)
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn body(&self, extra: Value) -> Value {
        let mut body = json!({
            "model": self.model,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
        });
        if let (Some(obj), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        if let Some(ref opts) = self.config.options {
            if let (Some(options), Some(custom)) =
                (body["options"].as_object_mut(), opts.as_object())
            {
                for (k, v) in custom {
                    options.insert(k.clone(), v.clone());
                }
            }
        }
        body
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        let url = self.url(path);
        let resp = self.http.post(&url).json(body).send().await.map_err(|e| {
            FlowError::Llm(format!(
                "failed to reach Ollama at {}: {}. Check that Ollama is running and the \
                 model '{}' has been pulled.",
                url, e, self.model
            ))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(FlowError::Llm(format!(
                "Ollama returned error {}: {}",
                status, text
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self.body(json!({ "prompt": prompt, "stream": false }));
        let resp = self.post("/api/generate", &body).await?;
        let json_response: Value = resp.json().await?;
        let raw = json_response
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        Ok(strip_think_tags(&raw).trim().to_string())
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let mut messages = vec![];
        if !system.is_empty() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": user}));

        let body = self.body(json!({ "messages": messages, "stream": false }));
        let resp = self.post("/api/chat", &body).await?;
        let json_response: Value = resp.json().await?;
        let raw = json_response
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        Ok(strip_think_tags(&raw).trim().to_string())
    }

    async fn generate_streaming(
        &self,
        prompt: &str,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        let body = self.body(json!({ "prompt": prompt, "stream": true }));
        let resp = self.post("/api/generate", &body).await?;

        let mut stream = resp.bytes_stream();
        let mut accumulated = String::new();
        // Chunk boundaries may split a JSON line, so carry the remainder.
        let mut carry = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(FlowError::Request)?;
            carry.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = carry.find('\n') {
                let line: String = carry.drain(..=pos).collect();
                if let Ok(json) = serde_json::from_str::<Value>(line.trim()) {
                    if let Some(token) = json.get("response").and_then(|v| v.as_str()) {
                        accumulated.push_str(token);
                        on_token(token);
                    }
                }
            }
        }
        if let Ok(json) = serde_json::from_str::<Value>(carry.trim()) {
            if let Some(token) = json.get("response").and_then(|v| v.as_str()) {
                accumulated.push_str(token);
                on_token(token);
            }
        }

        Ok(strip_think_tags(&accumulated).trim().to_string())
    }
}

/// Generator that always returns the same text. Handy for tests and for
/// exercising a workflow without a running Ollama server.
#[derive(Debug, Clone)]
pub struct FixedGenerator {
    text: String,
}

impl FixedGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.text.clone())
    }

    async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self.text.clone())
    }

    async fn generate_streaming(
        &self,
        _prompt: &str,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        on_token(&self.text);
        Ok(self.text.clone())
    }
}
