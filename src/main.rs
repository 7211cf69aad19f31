use std::sync::Arc;

use filebox::config::{AppState, Config};
use filebox::{logger, server};

const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // First argument names the config file, without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Build the Tokio runtime, worker count from `server.workers`
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    if let Err(e) = runtime.block_on(async_main(cfg)) {
        tracing::error!("Failed to start server: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = cfg.get_socket_addr()?;
    let backlog = cfg.server.backlog;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg)?);
    let listener = server::create_listener(addr, backlog)?;

    server::start_server_loop(listener, state, server::signal::shutdown_signal()).await;
    tracing::info!("Server stopped");
    Ok(())
}
