//! Service binary: config, tracing, HTTP API.

use rlm_agent::config::ServerConfig;
use rlm_agent::server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rlm_agent::tracing::init_tracing("rlm-agent");

    let config = ServerConfig::from_env()?;
    let listen_addr = config.listen_addr.clone();

    tracing::info!(
        model = %config.model_name,
        repl_env = %config.repl_env_url,
        max_iterations = config.max_iterations,
        "Starting rlm-agent"
    );

    let state = AppState::new(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(addr = %listen_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
