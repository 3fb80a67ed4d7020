use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::corpus::ExampleStore;
use crate::llm_client::CompletionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read by every generation; written only by an explicit reload.
    pub store: Arc<RwLock<ExampleStore>>,
    /// Process-wide completion handle (`SharedLlm` in production).
    pub llm: Arc<dyn CompletionService>,
    pub config: Config,
}
