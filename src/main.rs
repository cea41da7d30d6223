use axum::{extract::Request, ServiceExt};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info, warn};

use blog_crud_api::{
    config::{Config, StorageBackend},
    create_router,
    middleware::init_tracing,
    AppState, Database, MemoryStore, Store,
};

#[tokio::main]
async fn main() {
    // Configuration first: the log format depends on the environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.environment) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }
    info!("Configuration loaded successfully");

    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            std::process::exit(1);
        }
    };

    let app = create_router(AppState::new(store.clone()), config.request_timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("server running at: http://localhost:{}", config.port);

    let served = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Connects and migrates PostgreSQL, or builds an empty in-memory store.
async fn build_store(config: &Config) -> blog_crud_api::ApiResult<Arc<dyn Store>> {
    match (config.backend, config.database.as_ref()) {
        (StorageBackend::Postgres, Some(database_config)) => {
            let database = Database::connect(database_config).await?;
            database.migrate().await?;
            info!("Database connection established");
            Ok(Arc::new(database))
        }
        (StorageBackend::Postgres, None) => Err(blog_crud_api::ApiError::from(anyhow::anyhow!(
            "PostgreSQL backend selected without database settings"
        ))),
        (StorageBackend::Memory, _) => {
            warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
