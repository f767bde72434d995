use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use sre_api::{AppState, TokenStore};
use sre_config::{load_server_config, load_worker_config, tool_catalogue_from_env};
use sre_engine::{HttpOracle, ReasoningOracle, RecordedOracle, ToolCatalogue};
use sre_store::{InMemorySessionStore, PostgresRepository, RedisSessionStore, Repository, SessionStore};

/// Runs the control-plane HTTP API (§6): load config, build the shared
/// dependencies, hand them to `build_app`, bind, serve.
pub async fn serve() -> Result<()> {
    let config = load_server_config().context("failed to load server configuration")?;

    let repo: Arc<dyn Repository> = Arc::new(
        PostgresRepository::connect(&config.database_url)
            .await
            .context("failed to connect to the database")?,
    );

    let session_store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisSessionStore::connect(url)
                .await
                .context("failed to connect to redis")?,
        ),
        None => {
            tracing::warn!("REDIS_URL not set; using an in-memory session store (single process only)");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let oracle: Arc<dyn ReasoningOracle> = match &config.oracle_url {
        Some(url) => Arc::new(HttpOracle::new(url.clone())),
        None => {
            tracing::warn!("ORACLE_URL not set; investigations will run without a reasoning oracle");
            Arc::new(RecordedOracle::new())
        }
    };

    let tools = tool_catalogue_from_env();
    let catalogue = Arc::new(ToolCatalogue::from_config(&tools, repo.clone()));

    let state = AppState {
        repo,
        session_store,
        oracle,
        catalogue,
        user_tokens: Arc::new(TokenStore::new()),
    };

    let app = sre_api::build_app(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "sre control plane listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Runs the edge worker poll loop (§4.4). Returns `ExitCode::FAILURE` if
/// `CLUSTER_TOKEN` (or any other required worker env var) is absent — the
/// process exits cleanly with a non-zero code rather than silently doing
/// nothing, per §6's "absent ⇒ worker disabled".
pub async fn worker() -> Result<ExitCode> {
    let config = match load_worker_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("worker disabled: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let handle = sre_worker::start(config)
        .await
        .context("failed to start job poller")?;
    handle.await.context("job poller task panicked")?;
    Ok(ExitCode::SUCCESS)
}

/// Connects to the database and applies migrations (`PostgresRepository::connect`
/// runs them inline), then exits. A separate subcommand purely for deploy
/// tooling convenience — `serve` already does this on every startup.
pub async fn migrate() -> Result<()> {
    let config = load_server_config().context("failed to load server configuration")?;
    PostgresRepository::connect(&config.database_url)
        .await
        .context("migration failed")?;
    println!("migrations applied");
    Ok(())
}
