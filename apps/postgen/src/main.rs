mod config;
mod corpus;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod state;
mod tagging;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::corpus::ExampleStore;
use crate::llm_client::SharedLlm;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tagging::pipeline::run_preprocessing;

const USAGE: &str = "usage: postgen [serve | preprocess]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // One completion client per process, created on first use.
    let llm = Arc::new(SharedLlm::new(config.secrets_path.clone()));

    match std::env::args().nth(1).as_deref() {
        None | Some("serve") => serve(config, llm).await,
        Some("preprocess") => preprocess(config, llm).await,
        Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

async fn serve(config: Config, llm: Arc<SharedLlm>) -> Result<()> {
    info!("Starting postgen v{}", env!("CARGO_PKG_VERSION"));

    // A missing corpus is not fatal: topics fall back to defaults and
    // /api/v1/corpus/reload can pick the files up later.
    let store = match ExampleStore::load(&config.corpus_paths()) {
        Ok(store) => store,
        Err(e) => {
            warn!("Starting with an empty corpus: {e}");
            ExampleStore::default()
        }
    };

    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn preprocess(config: Config, llm: Arc<SharedLlm>) -> Result<()> {
    let paths = config.corpus_paths();
    info!("Preprocessing {}", paths.raw.display());

    let report = run_preprocessing(&paths, llm.as_ref()).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
