use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database::init_db;
use server::dispatch::Dispatcher;
use server::seed;
use server::state::AppState;
use server::utils::storage::build_object_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    config
        .window
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid [window]")?;
    if config.events.webhook_secret.is_empty() {
        tracing::warn!("events.webhook_secret is empty; event intake and operator routes are disabled");
    }

    let db = init_db(&config.database)
        .await
        .context("failed to connect to database")?;
    seed::ensure_indexes(&db).await?;

    if let Some(path) = &config.codes.seed_file {
        let codes = seed::read_code_file(path)
            .with_context(|| format!("failed to read codes from {}", path.display()))?;
        seed::issue_codes(&db, &codes).await?;
    }

    let object_store = build_object_store(&config)
        .await
        .context("failed to initialise object storage")?;
    let dispatcher = Dispatcher::from_config(&config).context("failed to initialise sinks")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        object_store,
        dispatcher: Arc::new(dispatcher),
    };

    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
