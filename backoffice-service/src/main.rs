use backoffice_core::observability::logging::{init_tracing, shutdown_tracing};
use backoffice_service::config::BackofficeConfig;
use backoffice_service::services::init_metrics;
use backoffice_service::startup::Application;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BackofficeConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics();

    info!(service = %config.service_name, port = config.port, "Starting back-office service");

    let application = Application::build(config).await?;

    tokio::select! {
        result = application.run_until_stopped() => {
            result?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping");
        }
    }

    shutdown_tracing();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
