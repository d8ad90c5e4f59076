//! Application startup: database pool, mailer, router, and the bound
//! listener. Binding port 0 lets integration tests pick a free port.

use crate::config::BackofficeConfig;
use crate::handlers;
use crate::services::{Database, Mailer};
use axum::{middleware, serve::Serve, Router};
use backoffice_core::error::AppError;
use backoffice_core::middleware::metrics::metrics_middleware;
use backoffice_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub mailer: Arc<Mailer>,
}

pub struct Application {
    port: u16,
    server: Serve<Router, Router>,
}

impl Application {
    pub async fn build(config: BackofficeConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        db.run_migrations().await?;

        Self::build_with_database(config, db).await
    }

    /// Build against an existing pool; used by tests that manage their own
    /// schema.
    pub async fn build_with_database(
        config: BackofficeConfig,
        db: Database,
    ) -> Result<Self, AppError> {
        let mailer = Arc::new(Mailer::new(config.smtp.clone())?);

        let state = AppState { db, mailer };

        let app = handlers::api_router(state)
            .layer(middleware::from_fn(metrics_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to bind: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to read addr: {}", e)))?
            .port();

        info!(port = port, "HTTP server listening");

        let server = axum::serve(listener, app);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
