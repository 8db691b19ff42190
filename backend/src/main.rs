use anyhow::Context;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use testlab_backend::app::build_router;
use testlab_backend::auth::spawn_session_sweeper;
use testlab_backend::config::Settings;
use testlab_backend::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = Settings::from_env().context("Invalid configuration")?;
    let bind_address = format!("{}:{}", settings.bind_address, settings.port);

    let state = AppState::initialize(settings).await?;

    // Background tasks
    let sweeper = spawn_session_sweeper(state.sessions.clone(), SESSION_SWEEP_INTERVAL);
    let limiter = state.rate_limiter.clone();
    let purger = tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.purge_idle(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, "Dropped idle rate-limit entries");
            }
        }
    });

    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("TestLab backend listening on {}", listener.local_addr()?);

    if state.config.read().await.is_setup {
        tracing::info!(
            analyzers = ?state.analyzers.read().await.names(),
            "System configured and ready"
        );
    } else {
        tracing::warn!("Setup required: complete it through POST /api/setup/complete");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    sweeper.abort();
    purger.abort();
    tracing::info!("TestLab backend stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
    tracing::info!("Shutdown signal received");
}
