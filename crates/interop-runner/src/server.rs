//! The process entry point's `run()`: logging and config bootstrap,
//! graceful-shutdown wiring, and the axum server loop. Mirrors the teacher
//! codebase's `engine-runner::run::server` shape.

use anyhow::Result;
use axum::Router;
use interop_composition::{build_root, Collaborators, RootConfig};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Spawns the task that cancels `cancel_token` on Ctrl+C or SIGTERM,
/// tearing down the heartbeat schedulers and the accept loop together
/// (§1 "Graceful shutdown").
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("received Ctrl+C, initiating graceful shutdown..."),
            _ = terminate => tracing::info!("received SIGTERM, initiating graceful shutdown..."),
        }

        cancel_token.cancel();
    });
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "interop_root=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting interop root coordinator");

    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let config = RootConfig::from_env()?;
    tracing::info!(
        app_directory_urls = ?config.app_directory_urls,
        server_addr = %config.server_addr,
        heartbeat_interval_ms = config.heartbeat_interval.as_millis(),
        heartbeat_max_misses = config.heartbeat_max_misses,
        "configuration loaded"
    );

    let wired = build_root(&config, Collaborators::default(), cancel_token.clone());

    tracing::warn!("CORS configured to allow any origin - tighten this for a production deployment");
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/", axum::routing::get(|| async { "interop root coordinator" }))
        .merge(interop_adapters::router(wired.transport.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!(addr = %config.server_addr, "listening");

    let server = axum::serve(listener, app).with_graceful_shutdown({
        let cancel_token = cancel_token.clone();
        async move {
            cancel_token.cancelled().await;
            tracing::info!("http server received shutdown signal");
        }
    });

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
    }

    cancel_token.cancel();
    tracing::info!("shutdown complete");
    Ok(())
}
