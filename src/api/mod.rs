//! HTTP server for the chat page
//!
//! One shared [`InteractionController`] sits behind a mutex; each request that
//! starts a turn holds the lock until the turn finishes, so a second trigger
//! waits rather than overlapping.

pub mod chat;
pub mod health;
pub mod page;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::Result;
use crate::config::DEFAULT_BIND;
use crate::controller::InteractionController;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<Mutex<InteractionController>>,

    /// Fixed for the session, readable without the turn lock
    pub session_id: Uuid,
    pub model: String,
    pub voice_available: bool,
    pub emotion_enabled: bool,
}

impl ApiState {
    /// Wrap a controller for sharing between handlers
    #[must_use]
    pub fn new(controller: InteractionController) -> Self {
        let session_id = controller.session().id();
        let model = controller.session().dialogue().model().to_string();
        let voice_available = controller.voice_enabled();
        let emotion_enabled = controller.emotion_enabled();

        Self {
            controller: Arc::new(Mutex::new(controller)),
            session_id,
            model,
            voice_available,
            emotion_enabled,
        }
    }
}

/// Chat page server
pub struct ApiServer {
    state: Arc<ApiState>,
    bind: IpAddr,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            bind: DEFAULT_BIND,
            port,
            static_dir: None,
        }
    }

    /// Listen on a different address than loopback
    #[must_use]
    pub fn bind(mut self, addr: IpAddr) -> Self {
        self.bind = addr;
        self
    }

    /// Serve extra files (images, styles) from a directory
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        Arc::clone(&self.state)
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(page::router())
            .nest("/api", chat::router(Arc::clone(&self.state)))
            .merge(health::router())
            .merge(health::status_router(Arc::clone(&self.state)));

        if let Some(static_dir) = &self.static_dir {
            router = router.nest_service("/static", ServeDir::new(static_dir));
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Run the server until the process is stopped
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(self.bind, self.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind server on {addr}: {e}")))?;

        if !self.bind.is_loopback() {
            tracing::warn!(%addr, "chat page is reachable from other hosts");
        }
        tracing::info!(%addr, "chat page at http://{addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
