//! Example Store — owns the example corpus and serves filtered views of it.
//!
//! Loading prefers the enriched corpus file. When it is absent the raw corpus
//! is derived on the fly and written back as a best-effort cache.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::corpus::models::{ExamplePost, LengthBucket, PostRecord, DEFAULT_LANGUAGE};
use crate::corpus::topics::infer_topic;
use crate::errors::AppError;

/// Locations of the two corpus files.
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    /// Enriched corpus: output of preprocessing, also the derivation cache.
    pub processed: PathBuf,
    /// Raw corpus: preprocessing input and load fallback.
    pub raw: PathBuf,
}

/// How multiple requested tags combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one requested tag present.
    #[default]
    Any,
    /// Every requested tag present.
    All,
}

/// Conjunction of optional filters over the corpus.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub length: Option<LengthBucket>,
    /// Exact, case-sensitive match.
    pub language: Option<String>,
    /// Empty means no tag filter, whatever the match mode.
    pub tags: Vec<String>,
    pub match_mode: MatchMode,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: LengthBucket) -> Self {
        self.length = Some(length);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    fn matches(&self, post: &ExamplePost) -> bool {
        if self.length.is_some_and(|l| l != post.length) {
            return false;
        }
        if self.language.as_deref().is_some_and(|l| l != post.language) {
            return false;
        }
        if self.tags.is_empty() {
            return true;
        }
        match self.match_mode {
            MatchMode::All => self.tags.iter().all(|t| post.has_tag(t)),
            MatchMode::Any => self.tags.iter().any(|t| post.has_tag(t)),
        }
    }
}

/// The loaded corpus plus its tag index. Read-only between reloads.
#[derive(Debug, Default)]
pub struct ExampleStore {
    posts: Vec<ExamplePost>,
    tag_index: BTreeSet<String>,
}

impl ExampleStore {
    /// Loads the enriched corpus, or derives it from the raw corpus.
    pub fn load(paths: &CorpusPaths) -> Result<Self, AppError> {
        if paths.processed.exists() {
            let records = read_records(&paths.processed)?;
            let store = Self::from_records(records);
            info!(
                "Loaded {} example posts from {}",
                store.posts.len(),
                paths.processed.display()
            );
            return Ok(store);
        }

        if paths.raw.exists() {
            let records = read_records(&paths.raw)?;
            let store = Self::from_records(records);
            info!(
                "Derived {} example posts from raw corpus {}",
                store.posts.len(),
                paths.raw.display()
            );
            if let Err(e) = write_corpus(&paths.processed, &store.posts) {
                warn!("Could not cache derived corpus: {e:#}");
            }
            return Ok(store);
        }

        Err(AppError::Load(format!(
            "neither {} nor {} exists",
            paths.processed.display(),
            paths.raw.display()
        )))
    }

    /// Replaces the contents with a fresh load. On failure the old contents stay.
    pub fn reload(&mut self, paths: &CorpusPaths) -> Result<(), AppError> {
        *self = Self::load(paths)?;
        Ok(())
    }

    pub fn from_posts(posts: Vec<ExamplePost>) -> Self {
        let tag_index = posts.iter().flat_map(|p| p.tags.iter().cloned()).collect();
        Self { posts, tag_index }
    }

    fn from_records(records: Vec<PostRecord>) -> Self {
        let posts = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| {
                let post = derive_post(record);
                if post.is_none() {
                    warn!("Skipping corpus record #{i}: empty text");
                }
                post
            })
            .collect();
        Self::from_posts(posts)
    }

    pub fn posts(&self) -> &[ExamplePost] {
        &self.posts
    }

    /// Every distinct tag in the corpus, sorted.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tag_index
    }

    /// Posts satisfying every filter, in corpus order.
    pub fn filtered_posts(&self, filter: &PostFilter) -> Vec<&ExamplePost> {
        self.posts.iter().filter(|p| filter.matches(p)).collect()
    }
}

/// Number of non-empty lines, never less than 1.
pub fn count_lines(text: &str) -> u32 {
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    u32::try_from(lines).unwrap_or(u32::MAX).max(1)
}

/// Fills in every attribute the record lacks. Returns `None` for blank text.
pub fn derive_post(record: PostRecord) -> Option<ExamplePost> {
    let text = record.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return None;
    }

    let line_count = record
        .line_count
        .filter(|n| *n > 0)
        .unwrap_or_else(|| count_lines(text));

    let title = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    let tags = match (record.tags, &title) {
        (Some(tags), _) => tags,
        (None, Some(title)) => vec![title.clone()],
        (None, None) => vec![infer_topic(text).to_string()],
    };

    let title = title
        .or_else(|| tags.first().cloned())
        .unwrap_or_default();

    Some(ExamplePost {
        text: text.to_string(),
        engagement: record.engagement,
        line_count,
        length: LengthBucket::from_line_count(line_count),
        language: record
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        tags,
        title,
    })
}

/// Reads a JSON array of corpus records.
pub fn read_records(path: &Path) -> Result<Vec<PostRecord>, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Load(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::Load(format!(
            "{} is not a JSON array of post records: {e}",
            path.display()
        ))
    })
}

/// Overwrites `path` with the corpus. Written to a temp file first so readers
/// never see a half-written corpus.
pub fn write_corpus(path: &Path, posts: &[ExamplePost]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, posts).context("Failed to serialize corpus")?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
