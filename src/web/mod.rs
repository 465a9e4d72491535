//! Web layer module
//!
//! JSON API consumed by the dashboard. Handlers are thin: they parse the
//! request, call into [`Database`] and wrap the outcome with
//! [`responses::handle_result`].

use anyhow::Result;
use axum::{
    routing::{get, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{config::Config, database::Database};

pub mod extractors;
pub mod handlers;
pub mod responses;

pub use responses::{handle_error, handle_result, ApiResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, database: Database) -> Result<Self> {
        let app = create_router(AppState { database });
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        Ok(Self { app, addr })
    }

    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Dashboard API listening on http://{}", self.addr);
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
}

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        // Middleware (applied in reverse order)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_v1_routes() -> Router<AppState> {
    use handlers::{channels, videos};

    Router::new()
        // Channels
        .route("/channels", get(channels::list_channels))
        .route(
            "/channels/:id",
            get(channels::get_channel).delete(channels::delete_channel),
        )
        .route("/channels/:id/history/subscribers", get(channels::subscriber_history))
        .route("/channels/:id/history/views", get(channels::view_history))
        .route("/channels/:id/publications", get(channels::publications))
        .route("/channels/:id/chart/:metric", get(channels::chart))
        .route("/channels/:id/videos", get(channels::list_videos))
        // Videos
        .route("/videos/:id", get(videos::get_video))
        .route("/videos/:id/history/views", get(videos::view_history))
        .route("/videos/:id/hidden", put(videos::set_hidden))
        .route(
            "/videos/:id/analysis",
            put(videos::save_analysis).delete(videos::delete_analysis),
        )
        .route("/videos/:id/analysis/template", get(videos::get_analysis_template))
}
