//! Main server implementation

use axum::Router;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer, map_response_body::MapResponseBodyLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use triage_tracker::{ExceptionService, IssueTracker, JiraClient};

use crate::{api, config::Config, Result};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExceptionService>,
}

impl AppState {
    pub fn new(tracker: Arc<dyn IssueTracker>, config: &Config) -> Result<Self> {
        let service = ExceptionService::new(tracker, config.triage.clone())?;
        Ok(Self {
            service: Arc::new(service),
        })
    }
}

/// Build the application router with middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    api::create_api_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout()))
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes)),
        )
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<()> {
    let tracker = Arc::new(JiraClient::new(&config.jira_config())?);
    info!("Using issue tracker at {}", config.tracker.base_url);

    let state = AppState::new(tracker, &config)?;
    let app = create_router(state, &config);

    let address = config.server_addr()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
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
