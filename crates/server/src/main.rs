use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use anyhow::Context;
use db::DBService;
use server::{AppState, config::PlannerConfig, file_logging, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("PLANNER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let _file_log_guard = file_logging::init_logging(&log_level);

    let config = PlannerConfig::from_env().context("failed to load configuration")?;
    let addr = config.bind_addr()?;

    let db = DBService::new(&config.db_config())
        .await
        .context("failed to open database")?;
    let state = AppState::new(db.clone(), config);

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let period = limiter
            .idle_ttl()
            .clamp(Duration::from_secs(60), Duration::from_secs(3600));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = limiter.prune(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, "Pruned idle rate limit buckets");
            }
        }
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        version = utils::build_info::BUILD_INFO.version,
        git_commit = utils::build_info::BUILD_INFO.git_commit,
        "PlannerOS listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }

    tracing::info!("Shutdown signal received");
}
