//! Offline preprocessing job: raw corpus → enriched, tag-unified corpus.
//!
//! Stages run strictly in order: Loaded → Enriched → Mapped → Persisted.
//! Nothing is written unless every post was enriched and the mapping call
//! succeeded; there is no per-post commit.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::corpus::models::PostRecord;
use crate::corpus::store::{read_records, write_corpus};
use crate::corpus::{CorpusPaths, ExamplePost, LengthBucket};
use crate::errors::AppError;
use crate::llm_client::CompletionService;
use crate::tagging::prompts::CANONICAL_TAGS;
use crate::tagging::unifier::{apply_mapping, build_unified_mapping, extract_metadata, PostMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Loaded,
    Enriched,
    Mapped,
    Persisted,
}

/// Summary printed by the `preprocess` command.
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessReport {
    pub posts: usize,
    pub distinct_tags_before: usize,
    /// Mapping entries the model returned.
    pub mapped_tags: usize,
    pub distinct_tags_after: usize,
    pub output: PathBuf,
}

/// Runs the whole job against `paths.raw`, overwriting `paths.processed`.
pub async fn run_preprocessing(
    paths: &CorpusPaths,
    llm: &dyn CompletionService,
) -> Result<PreprocessReport, AppError> {
    let records = read_records(&paths.raw)?;
    log_stage(PipelineStage::Loaded, records.len());

    let mut posts = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        let text = record.text.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            warn!("Skipping raw record #{i}: empty text");
            continue;
        }
        let metadata = extract_metadata(text, llm).await.map_err(|e| match e {
            AppError::Parse(msg) => AppError::Parse(format!("post #{i}: {msg}")),
            other => other,
        })?;
        posts.push(enrich(record, metadata));
    }
    log_stage(PipelineStage::Enriched, posts.len());

    let observed = observed_tags(&posts);
    let mapping = build_unified_mapping(&observed, CANONICAL_TAGS, llm).await?;
    if mapping.is_empty() && !observed.is_empty() {
        warn!("Tag mapping is empty; every tag is kept as extracted");
    }
    let posts: Vec<ExamplePost> = apply_mapping(posts, &mapping)
        .into_iter()
        .map(fill_title)
        .collect();
    let distinct_after = observed_tags(&posts).len();
    log_stage(PipelineStage::Mapped, posts.len());

    write_corpus(&paths.processed, &posts)?;
    log_stage(PipelineStage::Persisted, posts.len());

    Ok(PreprocessReport {
        posts: posts.len(),
        distinct_tags_before: observed.len(),
        mapped_tags: mapping.len(),
        distinct_tags_after: distinct_after,
        output: paths.processed.clone(),
    })
}

fn log_stage(stage: PipelineStage, posts: usize) {
    info!("Preprocessing stage {:?}: {} posts", stage, posts);
}

/// Merges extracted metadata over the raw record. Extracted values win.
fn enrich(record: PostRecord, metadata: PostMetadata) -> ExamplePost {
    let text = record.text.as_deref().map(str::trim).unwrap_or_default();
    ExamplePost {
        text: text.to_string(),
        engagement: record.engagement,
        line_count: metadata.line_count,
        length: LengthBucket::from_line_count(metadata.line_count),
        language: metadata.language.as_str().to_string(),
        tags: metadata.tags,
        title: record
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Posts without a title take their first (already unified) tag.
fn fill_title(mut post: ExamplePost) -> ExamplePost {
    if post.title.is_empty() {
        post.title = post.tags.first().cloned().unwrap_or_default();
    }
    post
}

fn observed_tags(posts: &[ExamplePost]) -> BTreeSet<String> {
    posts.iter().flat_map(|p| p.tags.iter().cloned()).collect()
}
