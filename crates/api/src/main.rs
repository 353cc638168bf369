use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use melody_api::bot::ConversationLoop;
use melody_api::config::ServerConfig;
use melody_api::router::build_app_router;
use melody_api::state::AppState;
use melody_pipeline::{GenerationTracker, JobRegistry};
use melody_suno::{SunoApi, SunoConfig};
use melody_telegram::TelegramBot;

/// How long shutdown waits for in-flight push deliveries.
const DELIVERY_DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "melody_api=debug,melody_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        host = %config.host,
        port = config.port,
        callback_url = %config.callback_url,
        poll_grace_secs = config.poll_grace_secs,
        "Loaded server configuration",
    );

    // --- Outbound clients ---
    let suno = SunoApi::new(
        SunoConfig::new(config.suno_api_key.clone())
            .with_base_url(config.suno_base_url.clone())
            .with_audio_fetch_timeout(config.audio_fetch_timeout()),
    )
    .expect("Failed to build Suno client");
    let bot = TelegramBot::with_api_url(&config.bot_token, &config.telegram_api_url)
        .expect("Failed to build Telegram client");
    let transport = Arc::new(bot.clone());

    // --- Generation tracker ---
    let registry = Arc::new(JobRegistry::new());
    let tracker = GenerationTracker::new(
        Arc::clone(&registry),
        Arc::new(suno),
        transport.clone(),
        config.poll_grace(),
    );
    tracing::info!("Generation tracker created");

    // --- Telegram update loop ---
    let updates_cancel = CancellationToken::new();
    let conversation = ConversationLoop::new(transport, tracker.clone(), config.callback_url.clone());
    let updates_handle = tokio::spawn(conversation.run(bot, updates_cancel.clone()));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: tracker.clone(),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    updates_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), updates_handle).await;
    tracing::info!("Telegram update loop stopped");

    if tokio::time::timeout(DELIVERY_DRAIN_TIMEOUT, tracker.wait_for_deliveries())
        .await
        .is_err()
    {
        tracing::warn!("Push deliveries still running at shutdown, abandoning them");
    }

    let pending = registry.len();
    tracker.shutdown();
    tracing::info!(pending, "Pending tasks dropped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
