use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use weather_form::{init_tracing, router, AppState, Config, OpenWeatherProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    // Load configuration
    let config = Config::load()?;

    let provider = OpenWeatherProvider::new(&config)?;
    let state = AppState::new(Arc::new(provider));

    let app = router(state, &config.static_dir);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🦀 Weather form server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Weather form server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
