/// LLM Client — the single point of entry for all completion calls in postgen.
///
/// ARCHITECTURAL RULE: No other module may call the Groq API directly.
/// Everything else depends on the `CompletionService` trait only.
///
/// Model: llama-3.3-70b-versatile (hardcoded — do not make configurable to prevent drift)
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub mod prompts;

#[cfg(test)]
pub mod mock;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// The model used for all completion calls.
pub const MODEL: &str = "llama-3.3-70b-versatile";
/// Name of the credential, both as an env var and as a secrets-file key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0}")]
    Credential(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Text-in/text-out completion capability.
///
/// Calls are blocking from the caller's point of view, are not retried and
/// carry no client-side timeout.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Thin wrapper over the Groq OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Resolves the API key from the secrets file, then the environment.
    pub fn from_sources(secrets_path: &Path) -> Result<Self, LlmError> {
        resolve_api_key(secrets_path).map(Self::new)
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyContent)
    }
}

/// The process-wide completion handle.
///
/// The underlying client is created on first use and reused for every later
/// call, so a missing key surfaces as a `Credential` error on the first
/// request instead of failing startup.
pub struct SharedLlm {
    secrets_path: PathBuf,
    client: OnceCell<LlmClient>,
}

impl SharedLlm {
    pub fn new(secrets_path: PathBuf) -> Self {
        Self {
            secrets_path,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&LlmClient, LlmError> {
        self.client
            .get_or_try_init(|| async {
                let client = LlmClient::from_sources(&self.secrets_path)?;
                info!("LLM client initialized (model: {MODEL})");
                Ok::<_, LlmError>(client)
            })
            .await
    }
}

#[async_trait]
impl CompletionService for SharedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.client().await?.complete(prompt).await
    }
}

/// Looks the key up in the secrets file first, then in the environment
/// (`.env` has already been loaded by `Config::from_env`).
pub fn resolve_api_key(secrets_path: &Path) -> Result<String, LlmError> {
    key_from_secrets_file(secrets_path)
        .or_else(|| std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| {
            LlmError::Credential(format!(
                "{API_KEY_VAR} not found. Add it to {} or set it in the environment / .env file.",
                secrets_path.display()
            ))
        })
}

fn key_from_secrets_file(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let secrets: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Ignoring unreadable secrets file {}: {e}", path.display());
            return None;
        }
    };
    secrets
        .get(API_KEY_VAR)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
}

/// Deserializes a completion reply that is supposed to be JSON.
/// Markdown code fences around the payload are tolerated, as is chatter
/// before or after a fenced block.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_json_fences(text))
}

/// First ```json ... ``` or ``` ... ``` block anywhere in the reply.
static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").ok());

/// Strips code fences from LLM output. Falls back to the whole reply when no
/// closed fence is found, minus an opening fence if there is one.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let block = FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1));
    if let Some(block) = block {
        return block.as_str().trim();
    }
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .map(str::trim)
        .unwrap_or(text)
}
