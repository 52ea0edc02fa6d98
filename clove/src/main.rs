//! `clove`: an Anthropic Messages API-compatible reverse proxy backed by a
//! pool of Claude.ai accounts.

mod args;
mod logger;
mod request;
mod routes;
mod state;

use std::{sync::Arc, time::Duration};

use accounts::AccountPool;
use axum::{Router, routing::post};
use clap::Parser;
use session::{HttpRateLimitProber, NotConfiguredIdentityClient, NotConfiguredSession};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{args::Args, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args.log_filter);

    let config = config::Config::load(&args.config).unwrap_or_else(|err| {
        log::warn!("Failed to load {}: {err}; using defaults", args.config.display());
        config::Config::default()
    });

    // TODO(clove): wire a real Claude-web transport in once one is chosen.
    let session_factory: state::SessionFactory =
        Arc::new(|_cookie: &secrecy::SecretString| Arc::new(NotConfiguredSession) as Arc<dyn session::Session>);

    let prober = Arc::new(HttpRateLimitProber::new(
        config.claude.claude_api_baseurl.clone(),
        session_factory.clone(),
    ));
    let identity = Arc::new(NotConfiguredIdentityClient);

    let pool = Arc::new(AccountPool::new(config.accounts.clone(), identity, prober));
    let tool_calls = Arc::new(streaming::ToolCallRegistry::new(Duration::from_secs(600)));

    let shutdown = CancellationToken::new();
    spawn_maintenance_loop(pool.clone(), config.accounts.account_task_interval, shutdown.clone());

    let state = Arc::new(AppState {
        pool,
        request_config: config.request,
        tool_calls,
        session_factory,
    });

    let app = Router::new().route("/v1/messages", post(routes::messages)).with_state(state);

    let listener = TcpListener::bind(config.server.listen_address).await?;
    log::info!("Listening on {}", config.server.listen_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    Ok(())
}

fn spawn_maintenance_loop(pool: Arc<AccountPool>, interval: Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => pool.run_maintenance_tick().await,
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

async fn wait_for_shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    shutdown.cancel();
}
