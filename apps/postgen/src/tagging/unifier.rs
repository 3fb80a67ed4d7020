//! Tag Unifier — per-post metadata extraction and canonical tag mapping.
//!
//! Both oracle calls go through `CompletionService`; neither is retried.
//! Mapping is requested once for the whole vocabulary so the model can merge
//! synonyms consistently and the number of calls stays constant.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::corpus::{ExamplePost, Language};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{parse_json_reply, CompletionService};
use crate::tagging::prompts::{EXTRACT_METADATA_PROMPT_TEMPLATE, UNIFY_TAGS_PROMPT_TEMPLATE};

/// Upper bound on tags the extraction prompt asks for.
pub const MAX_EXTRACTED_TAGS: usize = 2;

/// Structured metadata the model extracts from one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMetadata {
    pub line_count: u32,
    pub language: Language,
    pub tags: Vec<String>,
}

/// Original tag → canonical tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagMapping(BTreeMap<String, String>);

impl TagMapping {
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    /// Canonical form of `tag`, or `tag` itself when unmapped.
    pub fn resolve<'a>(&'a self, tag: &'a str) -> &'a str {
        self.get(tag).unwrap_or(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for TagMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Asks the model for line count, language and at most two tags.
pub async fn extract_metadata(
    post_text: &str,
    llm: &dyn CompletionService,
) -> Result<PostMetadata, AppError> {
    let prompt = EXTRACT_METADATA_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{post}", post_text);

    let reply = llm.complete(&prompt).await?;

    let mut metadata: PostMetadata = parse_json_reply(&reply).map_err(|e| {
        AppError::Parse(format!("metadata reply is not the expected JSON object: {e}"))
    })?;

    if metadata.line_count == 0 {
        return Err(AppError::Parse("metadata reply has line_count 0".to_string()));
    }
    if metadata.tags.len() > MAX_EXTRACTED_TAGS {
        return Err(AppError::Parse(format!(
            "metadata reply has {} tags (max {MAX_EXTRACTED_TAGS})",
            metadata.tags.len()
        )));
    }

    metadata.tags = metadata
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    debug!("Extracted metadata: {:?}", metadata);
    Ok(metadata)
}

/// Maps every observed tag onto one of `canonical` with a single model call.
///
/// Entries with a blank key or value are dropped. Observed tags the model
/// leaves out are reported and later pass through unchanged.
pub async fn build_unified_mapping(
    observed: &BTreeSet<String>,
    canonical: &[&str],
    llm: &dyn CompletionService,
) -> Result<TagMapping, AppError> {
    if observed.is_empty() {
        info!("No tags observed; skipping tag unification");
        return Ok(TagMapping::default());
    }

    let tags_list = observed.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    let prompt = UNIFY_TAGS_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{canonical}", &canonical.join(", "))
        .replace("{tags}", &tags_list);

    let reply = llm.complete(&prompt).await?;

    let value: serde_json::Value = parse_json_reply(&reply)
        .map_err(|e| AppError::Parse(format!("tag mapping reply is not valid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| AppError::Parse("tag mapping reply is not a JSON object".to_string()))?;

    let mut entries = Vec::with_capacity(object.len());
    for (key, value) in object {
        let value = value.as_str().ok_or_else(|| {
            AppError::Parse(format!("tag mapping value for '{key}' is not a string"))
        })?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            debug!("Dropping blank tag mapping entry {key:?} -> {value:?}");
            continue;
        }
        entries.push((key.to_string(), value.to_string()));
    }
    let mapping: TagMapping = entries.into_iter().collect();

    let unmapped: Vec<&str> = observed
        .iter()
        .map(String::as_str)
        .filter(|t| mapping.get(t).is_none())
        .collect();
    if !unmapped.is_empty() {
        warn!(
            "{} observed tag(s) left unmapped, keeping them as-is: {:?}",
            unmapped.len(),
            unmapped
        );
    }

    info!(
        "Unified {} observed tags onto {} canonical tags",
        observed.len(),
        canonical.len()
    );
    Ok(mapping)
}

/// Maps a tag list and drops repeats, keeping first occurrences in order.
pub fn unify_tags(tags: &[String], mapping: &TagMapping) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| mapping.resolve(t))
        .filter(|t| seen.insert(*t))
        .map(String::from)
        .collect()
}

/// Rewrites every post's tags through `mapping`. Pure and total.
pub fn apply_mapping(posts: Vec<ExamplePost>, mapping: &TagMapping) -> Vec<ExamplePost> {
    posts
        .into_iter()
        .map(|post| ExamplePost {
            tags: unify_tags(&post.tags, mapping),
            ..post
        })
        .collect()
}
