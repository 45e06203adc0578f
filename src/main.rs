//! Todo list service binary.
//!
//! Loads configuration, builds the logger and the selected storage backend,
//! then serves the HTTP API until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use mockable::DefaultClock;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

use todo_list::config::{Config, ConfigError, LogConfig, StorageBackend, load_env_file};
use todo_list::http;
use todo_list::task::{
    adapters::{memory::InMemoryTaskRepository, postgres::PostgresTaskRepository},
    ports::TaskRepository,
    services::TaskLifecycleService,
};
use todo_list::telemetry::Logger;

#[derive(Debug, Error)]
enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Extra time the service allows a `PostgreSQL` call beyond the database's
/// own deadline, so the rolled-back call reports before the service gives up.
const STORAGE_DEADLINE_GRACE: Duration = Duration::from_secs(1);

type EnvFileOutcome = Result<Option<PathBuf>, dotenvy::Error>;

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = load_env_file();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            let logger = fallback_logger();
            report_env_file(&logger, &env_file);
            logger.in_scope(|| tracing::error!(error = %err, "failed to load configuration"));
            return ExitCode::FAILURE;
        }
    };

    let logger = match Logger::new(&config.log.level) {
        Ok(logger) => logger,
        Err(err) => {
            fallback_logger().in_scope(|| {
                tracing::error!(error = %err, level = %config.log.level, "failed to build logger");
            });
            return ExitCode::FAILURE;
        }
    };

    report_env_file(&logger, &env_file);
    logger.in_scope(|| {
        tracing::info!(backend = ?config.storage.backend, "configuration loaded");
    });

    match serve(&config, &logger).await {
        Ok(()) => {
            logger.in_scope(|| tracing::info!("server shutdown complete"));
            ExitCode::SUCCESS
        }
        Err(err) => {
            logger.in_scope(|| tracing::error!(error = %err, "server stopped"));
            ExitCode::FAILURE
        }
    }
}

fn fallback_logger() -> Logger {
    Logger::from_directives(None, &LogConfig::default().level).unwrap_or_default()
}

fn report_env_file(logger: &Logger, env_file: &EnvFileOutcome) {
    logger.in_scope(|| match env_file {
        Ok(Some(path)) => tracing::info!(path = %path.display(), "loaded .env file"),
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env file"),
    });
}

async fn serve(config: &Config, logger: &Logger) -> Result<(), ServeError> {
    let (repository, service_timeout) = build_repository(config)?;
    let mut service =
        TaskLifecycleService::new(repository, Arc::new(DefaultClock), logger.clone());
    if let Some(timeout) = service_timeout {
        service = service.with_timeout(timeout);
    }
    let app = http::router(service, logger.clone());

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServeError::Bind {
            address: address.clone(),
            source,
        })?;

    logger.in_scope(|| match listener.local_addr() {
        Ok(local) => tracing::info!(address = %local, "listening"),
        Err(err) => tracing::warn!(error = %err, "could not determine local address"),
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(logger.clone()))
        .await
        .map_err(ServeError::Serve)
}

/// Builds the configured repository and the deadline the service should
/// apply on top of it.
///
/// `PostgreSQL` enforces the request timeout itself and rolls back calls
/// that overrun it; the service deadline then only backstops a stuck call.
fn build_repository(
    config: &Config,
) -> Result<(Arc<dyn TaskRepository>, Option<Duration>), ServeError> {
    let timeout = config.server.request_timeout();
    match config.storage.backend {
        StorageBackend::InMemory => Ok((Arc::new(InMemoryTaskRepository::new()), timeout)),
        StorageBackend::Postgres => {
            let manager = ConnectionManager::<PgConnection>::new(config.database_url()?);
            let builder = Pool::builder().max_size(config.storage.pool_size);
            let Some(limit) = timeout else {
                let pool = builder.build(manager)?;
                return Ok((Arc::new(PostgresTaskRepository::new(pool)), None));
            };
            let pool = builder.connection_timeout(limit).build(manager)?;
            let repository = PostgresTaskRepository::new(pool).with_deadline(limit);
            Ok((
                Arc::new(repository),
                Some(limit.saturating_add(STORAGE_DEADLINE_GRACE)),
            ))
        }
    }
}

/// Completes on Ctrl+C, or on SIGTERM where supported.
async fn shutdown_signal(logger: Logger) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            logger.in_scope(|| tracing::warn!(error = %err, "failed to install Ctrl+C handler"));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                logger.in_scope(|| tracing::warn!(error = %err, "failed to install SIGTERM handler"));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => logger.in_scope(|| tracing::info!("received Ctrl+C, shutting down")),
        () = terminate => logger.in_scope(|| tracing::info!("received SIGTERM, shutting down")),
    }
}
