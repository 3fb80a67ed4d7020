//! Post Generation — orchestrates the request path.
//!
//! Flow: build_prompt → completion call → enforce_length → strip_preamble.
//! The order is fixed; either post-processing step can be switched off.
//! Only prompt assembly reads the store, so callers can release the store
//! lock before the completion call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::corpus::{ExampleStore, Language, LengthBucket};
use crate::errors::AppError;
use crate::generation::assembler::{build_prompt, PromptRequest};
use crate::generation::postprocess::{enforce_length, strip_preamble};
use crate::llm_client::CompletionService;

/// Post-processing switches. Both on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GenerateOptions {
    #[serde(default = "enabled")]
    pub enforce_length: bool,
    #[serde(default = "enabled")]
    pub strip_preamble: bool,
}

fn enabled() -> bool {
    true
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            enforce_length: true,
            strip_preamble: true,
        }
    }
}

/// A generated post. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPost {
    pub id: Uuid,
    pub topic: String,
    pub length: LengthBucket,
    pub language: Language,
    /// Completion text exactly as returned.
    pub raw_text: String,
    /// Final text after post-processing.
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// A request with its prompt already assembled. Owns everything the
/// completion step needs, so it outlives any borrow of the store.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub request: PromptRequest,
    pub prompt: String,
}

/// Assembles the prompt for `request` from the current corpus.
pub fn prepare_prompt(store: &ExampleStore, request: PromptRequest) -> PreparedPrompt {
    let prompt = build_prompt(&request, store);
    PreparedPrompt { request, prompt }
}

/// Completes a prepared prompt and post-processes the reply. Errors from the
/// completion call are returned as-is; nothing is retried.
pub async fn generate_post(
    prepared: PreparedPrompt,
    llm: &dyn CompletionService,
    options: GenerateOptions,
) -> Result<GeneratedPost, AppError> {
    let PreparedPrompt { request, prompt } = prepared;
    let id = Uuid::new_v4();
    info!(
        "Generating post {id}: topic='{}' length={} language={}",
        request.topic,
        request.length.as_str(),
        request.language.as_str()
    );

    let raw_text = llm.complete(&prompt).await?;

    let mut text = raw_text.trim().to_string();
    if options.enforce_length {
        text = enforce_length(&text, request.length);
    }
    if options.strip_preamble {
        text = strip_preamble(&text);
    }

    info!("Generated post {id}: {} lines", text.lines().count());

    Ok(GeneratedPost {
        id,
        topic: request.topic,
        length: request.length,
        language: request.language,
        raw_text,
        text,
        generated_at: Utc::now(),
    })
}
