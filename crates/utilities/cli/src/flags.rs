//! Logging and metrics flags shared by the binaries.

use crate::{CliResult, LogFormat, LogRotation};
use clap::{ArgAction, Args};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

/// Logging flags.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Verbosity level: 1 = error, 2 = warn, 3 = info, 4 = debug, 5 = trace.
    /// Defaults to info. `-vvvv` selects debug.
    #[arg(
        short = 'v',
        long = "verbosity",
        action = ArgAction::Count,
        default_value = "3",
        global = true
    )]
    pub level: u8,

    /// Disable stdout logs.
    #[arg(long = "log.stdout.quiet", env = "LOG_STDOUT_QUIET", global = true)]
    pub stdout_quiet: bool,

    /// Format of the stdout logs.
    #[arg(
        long = "log.stdout.format",
        env = "LOG_STDOUT_FORMAT",
        default_value = "full",
        global = true
    )]
    pub stdout_format: LogFormat,

    /// Directory for file logs. File logs are disabled when unset.
    #[arg(long = "log.file.directory", env = "LOG_FILE_DIRECTORY", global = true)]
    pub file_directory: Option<PathBuf>,

    /// Format of the file logs.
    #[arg(long = "log.file.format", env = "LOG_FILE_FORMAT", default_value = "full", global = true)]
    pub file_format: LogFormat,

    /// Rotation of the file logs.
    #[arg(
        long = "log.file.rotation",
        env = "LOG_FILE_ROTATION",
        default_value = "daily",
        global = true
    )]
    pub file_rotation: LogRotation,
}

/// Prometheus metrics flags.
#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics.
    #[arg(long = "metrics.enabled", env = "METRICS_ENABLED", default_value_t = false)]
    pub enabled: bool,

    /// Address the metrics server listens on.
    #[arg(long = "metrics.addr", env = "METRICS_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub addr: IpAddr,

    /// Port the metrics server listens on.
    #[arg(long = "metrics.port", env = "METRICS_PORT", default_value_t = 9090)]
    pub port: u16,
}

impl MetricsArgs {
    /// Installs the Prometheus exporter when metrics are enabled.
    pub fn init_metrics(&self) -> CliResult<()> {
        if self.enabled {
            let addr = SocketAddr::new(self.addr, self.port);
            PrometheusBuilder::new().with_http_listener(addr).install()?;
            tracing::info!(target: "prometheus", "Serving metrics at: http://{addr}");
        }
        Ok(())
    }
}
