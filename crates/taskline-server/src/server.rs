//! Router assembly and the listener loop.

use std::future::Future;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use taskline_store::TaskRepository;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::routes;

/// Shared state accessible from Axum handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Task repository.
    pub repo: TaskRepository,
    /// When the server started.
    pub start_time: Instant,
}

impl AppState {
    /// State over `repo`, starting the uptime clock now.
    pub fn new(repo: TaskRepository) -> Self {
        Self {
            repo,
            start_time: Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/tasks", get(routes::list_tasks).post(routes::create_task))
        .route("/tasks/status/{is_completed}", get(routes::list_by_status))
        .route(
            "/tasks/{id}",
            get(routes::get_task)
                .patch(routes::update_task)
                .delete(routes::delete_task),
        )
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One `info` line per request.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let resp = next.run(req).await;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        latency_ms,
        "api request"
    );
    resp
}

/// Bind `config` and serve until `shutdown` resolves.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve<F>(config: &ServerConfig, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "taskline server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("taskline server stopped");
    Ok(())
}
