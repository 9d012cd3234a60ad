use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shipment_scorer::{
    handler::{self, AppState},
    loader::{CachedLoader, FileLoader, ModelLoader},
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env();
    tracing::info!("model path: {}", cfg.model_path.display());

    let files = FileLoader::new(&cfg.model_path);
    let loader: Arc<dyn ModelLoader> = if cfg.cache_model {
        tracing::info!("model caching enabled; loading on first request");
        Arc::new(CachedLoader::new(files))
    } else {
        Arc::new(files)
    };

    let app = handler::router(AppState::new(loader));

    tracing::info!("listening on {}{}", cfg.addr, handler::SCORE_ROUTE);
    let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
