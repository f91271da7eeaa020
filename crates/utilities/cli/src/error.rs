//! Error types for CLI utilities.

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

/// Errors that can occur in CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// The Prometheus exporter could not be installed.
    #[error("failed to initialize metrics: {0}")]
    MetricsInitialization(#[from] BuildError),
    /// The tracing subscriber could not be installed.
    #[error("failed to initialize tracing: {0}")]
    TracingInitialization(#[from] tracing_subscriber::util::TryInitError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
