//! Homedash - subscription and pantry dashboard API
//!
//! Main entry point for the HTTP server.

use std::process::ExitCode;
use std::sync::Arc;

use homedash_api::{build_router, AppContext};
use homedash_domain::{Config, HomedashError, Result};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be applied before the configuration is read
    let dotenv = dotenvy::dotenv();
    let config = homedash_infra::global_config();

    init_tracing(config.as_ref().is_ok_and(|config| config.server.json_logs));

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => debug!(error = %err, "No .env file loaded"),
    }

    let config = match config {
        Ok(config) => config.clone(),
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "homedash exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run(config: Config) -> Result<()> {
    let bind_addr = config.server.bind_addr.clone();

    let context = Arc::new(AppContext::new(config)?);
    context.start().await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| HomedashError::Config(format!("cannot bind {bind_addr}: {err}")))?;
    info!(addr = %bind_addr, "homedash listening");

    axum::serve(listener, build_router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| HomedashError::Internal(format!("server error: {err}")))?;

    info!("homedash stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!(error = %err, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
