pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/tags", get(handlers::handle_get_tags))
        .route("/api/v1/options", get(handlers::handle_get_options))
        .route("/api/v1/posts", get(handlers::handle_list_posts))
        .route("/api/v1/posts/generate", post(handlers::handle_generate))
        .route("/api/v1/corpus/reload", post(handlers::handle_reload))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::corpus::{ExamplePost, ExampleStore, LengthBucket};
    use crate::llm_client::mock::{PendingCompletion, ScriptedCompletion};
    use crate::llm_client::LlmError;

    fn config_in(dir: &Path) -> Config {
        Config {
            processed_posts_path: dir.join("processed_posts.json"),
            raw_posts_path: dir.join("raw_posts.json"),
            secrets_path: dir.join("secrets.json"),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn state_with(store: ExampleStore, llm: ScriptedCompletion, dir: &Path) -> AppState {
        AppState {
            store: Arc::new(RwLock::new(store)),
            llm: Arc::new(llm),
            config: config_in(dir),
        }
    }

    fn wealth_store() -> ExampleStore {
        ExampleStore::from_posts(vec![ExamplePost {
            text: "Save first, spend later.".to_string(),
            engagement: None,
            line_count: 1,
            length: LengthBucket::Short,
            language: "English".to_string(),
            tags: vec!["Wealth".to_string()],
            title: "Wealth".to_string(),
        }])
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(ExampleStore::default(), ScriptedCompletion::replying(&[]), dir.path());
        let (status, body) = send(state, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_tags_fall_back_when_corpus_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(ExampleStore::default(), ScriptedCompletion::replying(&[]), dir.path());
        let (status, body) = send(state, Request::get("/api/v1/tags").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tags"], json!(["Productivity", "Mindset"]));
    }

    #[tokio::test]
    async fn test_options_list_selectors() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(wealth_store(), ScriptedCompletion::replying(&[]), dir.path());
        let (_, body) = send(state, Request::get("/api/v1/options").body(Body::empty()).unwrap()).await;
        assert_eq!(body["topics"], json!(["Wealth"]));
        assert_eq!(body["lengths"], json!(["Short", "Medium", "Long"]));
        assert_eq!(body["languages"], json!(["English", "Hinglish"]));
    }

    #[tokio::test]
    async fn test_generate_returns_processed_post() {
        let dir = tempfile::tempdir().unwrap();
        let llm = ScriptedCompletion::replying(&["Here is a post\nPay yourself first.\n\nThen invest."]);
        let state = state_with(wealth_store(), llm, dir.path());

        let (status, body) = send(
            state,
            post_json(
                "/api/v1/posts/generate",
                json!({"topic": "Wealth", "length": "Short", "language": "English"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Pay yourself first.\nThen invest.");
        assert_eq!(body["length"], "Short");
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_topic() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(wealth_store(), ScriptedCompletion::replying(&[]), dir.path());
        let (status, body) = send(
            state,
            post_json("/api/v1/posts/generate", json!({"topic": "  ", "length": "Short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_renders_missing_credential_as_message() {
        let dir = tempfile::tempdir().unwrap();
        let llm = ScriptedCompletion::failing(LlmError::Credential("GROQ_API_KEY not found".into()));
        let state = state_with(wealth_store(), llm, dir.path());
        let (status, body) = send(
            state,
            post_json("/api/v1/posts/generate", json!({"topic": "Wealth", "length": "Long"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "CREDENTIAL_ERROR");
        assert_eq!(body["error"]["message"], "GROQ_API_KEY not found");
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("processed_posts.json"),
            json!([
                {"text": "one", "tags": ["Mindset"]},
                {"text": "two", "tags": ["Leadership", "Mindset"]}
            ])
            .to_string(),
        )
        .unwrap();
        let state = state_with(ExampleStore::default(), ScriptedCompletion::replying(&[]), dir.path());

        let (status, body) = send(state.clone(), post_json("/api/v1/corpus/reload", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"posts": 2, "tags": 2}));
        assert_eq!(state.store.read().await.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_reload_without_corpus_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(wealth_store(), ScriptedCompletion::replying(&[]), dir.path());
        let (status, body) = send(state.clone(), post_json("/api/v1/corpus/reload", json!({}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "LOAD_ERROR");
        assert_eq!(state.store.read().await.posts().len(), 1);
    }

    fn mixed_store() -> ExampleStore {
        let post = |text: &str, length: LengthBucket, language: &str, tags: &[&str]| ExamplePost {
            text: text.to_string(),
            engagement: None,
            line_count: 1,
            length,
            language: language.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            title: tags[0].to_string(),
        };
        ExampleStore::from_posts(vec![
            post("a", LengthBucket::Short, "English", &["Wealth"]),
            post("b", LengthBucket::Short, "Hinglish", &["Wealth", "Mindset"]),
            post("c", LengthBucket::Long, "English", &["Mindset"]),
        ])
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_list_posts_without_filters_returns_everything() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(mixed_store(), ScriptedCompletion::replying(&[]), dir.path());
        let (status, body) = send(state, get("/api/v1/posts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["posts"][0]["text"], "a");
    }

    #[tokio::test]
    async fn test_list_posts_combines_filters() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(mixed_store(), ScriptedCompletion::replying(&[]), dir.path());

        let (_, body) = send(state.clone(), get("/api/v1/posts?length=Short&language=Hinglish")).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["posts"][0]["text"], "b");

        let (_, body) = send(state.clone(), get("/api/v1/posts?tags=Wealth,Mindset")).await;
        assert_eq!(body["count"], 3);

        let (_, body) = send(state, get("/api/v1/posts?tags=Wealth,Mindset&match=all")).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["posts"][0]["text"], "b");
    }

    #[tokio::test]
    async fn test_list_posts_rejects_unknown_length() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(mixed_store(), ScriptedCompletion::replying(&[]), dir.path());
        let response = build_router(state)
            .oneshot(get("/api/v1/posts?length=Huge"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_slow_completion_does_not_block_reload_or_readers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("processed_posts.json"),
            json!([{"text": "one", "tags": ["Mindset"]}]).to_string(),
        )
        .unwrap();
        let state = AppState {
            store: Arc::new(RwLock::new(wealth_store())),
            llm: Arc::new(PendingCompletion),
            config: config_in(dir.path()),
        };

        let generation = tokio::spawn(send(
            state.clone(),
            post_json("/api/v1/posts/generate", json!({"topic": "Wealth", "length": "Short"})),
        ));
        // Let the generation reach the completion call.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (status, body) = tokio::time::timeout(
            Duration::from_millis(500),
            send(state.clone(), post_json("/api/v1/corpus/reload", json!({}))),
        )
        .await
        .expect("reload waited on the completion call");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"], 1);

        let (status, body) = tokio::time::timeout(Duration::from_millis(500), send(state, get("/api/v1/tags")))
            .await
            .expect("tags waited on the completion call");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tags"], json!(["Mindset"]));

        assert!(!generation.is_finished());
        generation.abort();
    }
}
