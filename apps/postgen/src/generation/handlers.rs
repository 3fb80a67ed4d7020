//! Axum route handlers for the Generation API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::corpus::{ExamplePost, Language, LengthBucket, MatchMode, PostFilter};
use crate::errors::AppError;
use crate::generation::assembler::PromptRequest;
use crate::generation::generator::{generate_post, prepare_prompt, GenerateOptions, GeneratedPost};
use crate::state::AppState;

/// Topics offered when the corpus carries no tags at all.
const FALLBACK_TOPICS: &[&str] = &["Productivity", "Mindset"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub prompt: PromptRequest,
    #[serde(flatten)]
    pub options: GenerateOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub length: Option<LengthBucket>,
    pub language: Option<String>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
    #[serde(default, rename = "match")]
    pub match_mode: MatchMode,
}

impl ListPostsQuery {
    fn into_filter(self) -> PostFilter {
        let mut filter = PostFilter::new().match_mode(self.match_mode);
        if let Some(length) = self.length {
            filter = filter.length(length);
        }
        if let Some(language) = self.language.filter(|l| !l.trim().is_empty()) {
            filter = filter.language(language.trim());
        }
        for tag in self.tags.iter().flat_map(|t| t.split(',')) {
            let tag = tag.trim();
            if !tag.is_empty() {
                filter = filter.tag(tag);
            }
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub count: usize,
    pub posts: Vec<ExamplePost>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub topics: Vec<String>,
    pub lengths: Vec<LengthBucket>,
    pub languages: Vec<Language>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub posts: usize,
    pub tags: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/tags
///
/// Sorted topics from the corpus tag index.
pub async fn handle_get_tags(State(state): State<AppState>) -> Json<TagsResponse> {
    Json(TagsResponse {
        tags: available_topics(&state).await,
    })
}

/// GET /api/v1/options
///
/// Everything a client needs to render the topic / length / language selectors.
pub async fn handle_get_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        topics: available_topics(&state).await,
        lengths: LengthBucket::ALL.to_vec(),
        languages: Language::ALL.to_vec(),
    })
}

/// GET /api/v1/posts?length=Short&language=English&tags=A,B&match=all
///
/// Corpus posts matching every given filter, in corpus order. `match`
/// decides whether a post needs any (default) or all of the listed tags.
pub async fn handle_list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Json<PostsResponse> {
    let filter = query.into_filter();
    let store = state.store.read().await;
    let posts: Vec<ExamplePost> = store.filtered_posts(&filter).into_iter().cloned().collect();

    Json(PostsResponse {
        count: posts.len(),
        posts,
    })
}

/// POST /api/v1/posts/generate
///
/// Builds the prompt, calls the model and returns the post-processed text.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GeneratedPost>, AppError> {
    if request.prompt.topic.trim().is_empty() {
        return Err(AppError::Validation("topic cannot be empty".to_string()));
    }

    // Store guard must not be held across the completion call.
    let prepared = {
        let store = state.store.read().await;
        prepare_prompt(&store, request.prompt)
    };
    let post = generate_post(prepared, state.llm.as_ref(), request.options).await?;

    Ok(Json(post))
}

/// POST /api/v1/corpus/reload
///
/// Re-reads the corpus files. The previous corpus stays in place if loading fails.
pub async fn handle_reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let mut store = state.store.write().await;
    store.reload(&state.config.corpus_paths())?;
    info!(
        "Corpus reloaded: {} posts, {} tags",
        store.posts().len(),
        store.tags().len()
    );

    Ok(Json(ReloadResponse {
        posts: store.posts().len(),
        tags: store.tags().len(),
    }))
}

async fn available_topics(state: &AppState) -> Vec<String> {
    let store = state.store.read().await;
    if store.tags().is_empty() {
        FALLBACK_TOPICS.iter().map(|t| t.to_string()).collect()
    } else {
        store.tags().iter().cloned().collect()
    }
}
