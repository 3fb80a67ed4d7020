//! Prompt Assembler — turns a generation request into the instruction prompt.
//!
//! At most one example post is embedded. It comes from the first stage of the
//! fallback chain that finds anything, and is the first hit in corpus order:
//! 1. same length bucket and tagged with the topic (language ignored)
//! 2. tagged with the topic, any length
//! 3. same length bucket, any tag

use serde::Deserialize;
use tracing::debug;

use crate::corpus::{ExamplePost, ExampleStore, Language, LengthBucket, PostFilter};
use crate::generation::prompts::{EXAMPLE_HEADING, HINGLISH_NOTE, POST_PROMPT_TEMPLATE};
use crate::llm_client::prompts::NO_PREAMBLE_INSTRUCTION;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptRequest {
    pub length: LengthBucket,
    #[serde(default)]
    pub language: Language,
    pub topic: String,
}

/// Which fallback stage produced the embedded example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    LengthAndTopic,
    TopicOnly,
    LengthOnly,
}

/// Runs the fallback chain and returns the first example found, if any.
pub fn select_example<'a>(
    store: &'a ExampleStore,
    length: LengthBucket,
    topic: &str,
) -> Option<(SelectionStage, &'a ExamplePost)> {
    let stages = [
        (
            SelectionStage::LengthAndTopic,
            PostFilter::new().length(length).tag(topic),
        ),
        (SelectionStage::TopicOnly, PostFilter::new().tag(topic)),
        (SelectionStage::LengthOnly, PostFilter::new().length(length)),
    ];

    stages.into_iter().find_map(|(stage, filter)| {
        store
            .filtered_posts(&filter)
            .first()
            .map(|post| (stage, *post))
    })
}

/// Builds the full generation prompt for `request`.
pub fn build_prompt(request: &PromptRequest, store: &ExampleStore) -> String {
    let language_note = match request.language {
        Language::Hinglish => HINGLISH_NOTE,
        Language::English => "",
    };

    let mut prompt = POST_PROMPT_TEMPLATE
        .replace("{length_range}", request.length.range_description())
        .replace("{length}", request.length.as_str())
        .replace("{language_note}", language_note)
        .replace("{language}", request.language.as_str())
        .replace("{no_preamble}", NO_PREAMBLE_INSTRUCTION)
        .replace("{topic}", &request.topic);

    match select_example(store, request.length, &request.topic) {
        Some((stage, example)) => {
            debug!(
                "Embedding example via {:?} for topic '{}' ({})",
                stage,
                request.topic,
                request.length.as_str()
            );
            prompt.push_str(&format!(
                "\n\n{EXAMPLE_HEADING}\n\nExample1\n\n{}",
                example.text
            ));
        }
        None => debug!(
            "No example found for topic '{}' ({})",
            request.topic,
            request.length.as_str()
        ),
    }

    prompt.trim().to_string()
}
