//! Scripted completion service for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionService, LlmError};

/// Returns canned replies in order and records every prompt it receives.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing(err: LlmError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedCompletion: no more replies")
    }
}

/// A completion that never returns, for exercising callers that must not
/// hold shared state across the call.
pub struct PendingCompletion;

#[async_trait]
impl CompletionService for PendingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        std::future::pending().await
    }
}
