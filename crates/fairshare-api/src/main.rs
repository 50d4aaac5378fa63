use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fairshare_api::{build_router, config::Config, mailer, state::AppState};
use fairshare_assistant::{AssistantClient, OpenAIAssistantClient};
use fairshare_chat::ThreadOrchestrator;
use fairshare_persist::{ContactStore, MongoStoreBuilder, PostStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting FairShare API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Assistant client
    let assistant: Arc<dyn AssistantClient> =
        Arc::new(OpenAIAssistantClient::from_config(&config.assistant_client())?);

    // One pooled client for the whole process
    tracing::info!("Connecting to MongoDB");
    let store = MongoStoreBuilder::new()
        .uri(&config.mongodb_uri)
        .database(&config.mongodb.database)
        .pool_size(config.mongodb.pool_size)
        .timeout(std::time::Duration::from_millis(config.mongodb.timeout_ms))
        .build()
        .await?;
    tracing::info!(database = %config.mongodb.database, "MongoDB connected");

    let chat = ThreadOrchestrator::builder()
        .store(Arc::new(store.clone()))
        .assistant(assistant)
        .assistant_id(config.openai_assistant_id.clone())
        .poll_interval(config.assistant.poll_interval())
        .run_timeout(config.assistant.run_timeout())
        .build()?;

    if config.request_timeout() <= config.assistant.run_timeout() {
        tracing::warn!(
            request_timeout_secs = config.server.request_timeout_secs,
            run_timeout_secs = config.assistant.run_timeout_secs,
            "Request timeout does not exceed the assistant run timeout; slow replies will be cut off"
        );
    }
    if config.backend_key.is_none() {
        tracing::warn!("BACKEND_KEY is not set; admin routes will reject every request");
    }

    let mailer = mailer::from_config(&config)?;
    let posts: Arc<dyn PostStore> = Arc::new(store.clone());
    let contacts: Arc<dyn ContactStore> = Arc::new(store.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, chat, posts, contacts, mailer).with_database(store));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}
