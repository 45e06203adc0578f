//! Logger handle passed explicitly to the components that emit events.
//!
//! The binary builds one [`Logger`] at start-up and hands clones of it to the
//! task service and the HTTP router. Events are emitted with the standard
//! `tracing` macros inside [`Logger::in_scope`], so nothing depends on a
//! process-wide subscriber being installed.

use std::env::VarError;
use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Errors returned while building a [`Logger`].
#[derive(Debug, Error)]
pub enum LoggerError {
    /// `RUST_LOG` is set but does not parse as a filter.
    #[error("invalid RUST_LOG filter: {0}")]
    InvalidEnvFilter(#[source] ParseError),

    /// `RUST_LOG` is set but is not valid unicode.
    #[error("RUST_LOG is not valid unicode")]
    NonUnicodeEnvFilter,

    /// The configured default directive does not parse as a filter.
    #[error("invalid log level directive: {0}")]
    InvalidDirective(#[source] ParseError),
}

/// Cloneable handle to a configured `tracing` dispatcher.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Builds a logger writing formatted events to stdout.
    ///
    /// `RUST_LOG` takes precedence over `default_directive` when set.
    ///
    /// # Errors
    ///
    /// Returns a [`LoggerError`] when `RUST_LOG` is set but unusable, or when
    /// `default_directive` is not a valid filter directive.
    pub fn new(default_directive: &str) -> Result<Self, LoggerError> {
        let from_env = match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) => Some(directives),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => return Err(LoggerError::NonUnicodeEnvFilter),
        };
        Self::from_directives(from_env.as_deref(), default_directive)
    }

    /// Builds a stdout logger from explicit filter directives.
    ///
    /// `env_directives` plays the part of `RUST_LOG`: when present it is used
    /// instead of `default_directive` and must parse on its own.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidEnvFilter`] or
    /// [`LoggerError::InvalidDirective`] for whichever directive was used.
    pub fn from_directives(
        env_directives: Option<&str>,
        default_directive: &str,
    ) -> Result<Self, LoggerError> {
        let filter = env_directives.map_or_else(
            || EnvFilter::try_new(default_directive).map_err(LoggerError::InvalidDirective),
            |directives| EnvFilter::try_new(directives).map_err(LoggerError::InvalidEnvFilter),
        )?;
        let subscriber = Registry::default().with(filter).with(fmt::layer());
        Ok(Self::from_dispatch(Dispatch::new(subscriber)))
    }

    /// Wraps an existing dispatcher.
    #[must_use]
    pub const fn from_dispatch(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Returns a logger that discards every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::from_dispatch(Dispatch::none())
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with this logger as the default dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}
