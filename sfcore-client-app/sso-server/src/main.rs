use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};

use sso_api::{build_router, AppState};
use sso_core::{AuthService, EventBus, SessionRevoked};
use sso_infrastructure::{HttpAccountApi, StoreHandle};
use sso_shared::config::AppConfig;

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    let _log_guard = sso_shared::telemetry::init_telemetry();

    info!("SSO Server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Open the shared store
    let store = StoreHandle::open(&config.store).await?;
    let sweeper =
        store.spawn_sweeper(Duration::from_secs(config.store.sweep_interval_seconds.max(1)));

    // Session revocation events
    let events = Arc::new(EventBus::default());
    let audit = tokio::spawn(audit_session_events(events.subscribe()));

    if config.account_api.base_url.is_empty() {
        warn!("account_api.base_url is empty, login will answer 500");
    }
    let account_api = Arc::new(HttpAccountApi::new(&config.account_api));

    let auth = Arc::new(AuthService::new(
        store.store(),
        account_api,
        events,
        Duration::from_secs(config.auth.code_ttl_seconds),
        Duration::from_secs(config.auth.access_token_ttl_seconds),
    ));

    let state = AppState::new(auth, &config);
    let limiter = state.login_limiter.clone();
    let limiter_pruner = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.prune();
        }
    });

    let app = build_router(state);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!(
        "{} listening on {} ({})",
        config.app.name, addr, config.app.env
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background work before closing the store
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    limiter_pruner.abort();
    audit.abort();
    store.close();

    info!("SSO Server stopped");
    Ok(())
}

async fn audit_session_events(mut rx: broadcast::Receiver<SessionRevoked>) {
    loop {
        match rx.recv().await {
            Ok(event) => info!(
                target: "audit",
                user_id = %event.user_id,
                app_id = event.app_id.as_deref().unwrap_or("*"),
                scope = ?event.scope,
                "Session revoked"
            ),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Audit subscriber lagged behind session events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
