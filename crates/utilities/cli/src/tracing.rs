//! [tracing_subscriber] utilities.

use crate::{LogConfig, LogRotation};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::MakeWriter,
    prelude::__tracing_subscriber_SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// File name prefix of the log files.
const LOG_FILE_NAME: &str = "kakarot-indexer.log";

/// The format of the logs.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full format (default).
    #[default]
    Full,
    /// JSON format.
    Json,
    /// Pretty format.
    Pretty,
    /// Compact format.
    Compact,
}

impl LogFormat {
    /// Builds a formatting layer writing to `writer`.
    fn layer<W>(self, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = tracing_subscriber::fmt::layer().with_writer(writer);
        match self {
            Self::Full => layer.boxed(),
            Self::Json => layer.json().boxed(),
            Self::Pretty => layer.pretty().boxed(),
            Self::Compact => layer.compact().boxed(),
        }
    }
}

impl LogConfig {
    /// Initializes the global tracing subscriber.
    ///
    /// `env_filter` defaults to `RUST_LOG`. The configured global level is added on top of it.
    pub fn init_tracing_subscriber(
        &self,
        env_filter: Option<EnvFilter>,
    ) -> Result<(), TryInitError> {
        let file_layer = self.file_logs.as_ref().map(|file_logs| {
            let directory = file_logs.directory_path.clone();
            let appender = match file_logs.rotation {
                LogRotation::Minutely => tracing_appender::rolling::minutely(directory, LOG_FILE_NAME),
                LogRotation::Hourly => tracing_appender::rolling::hourly(directory, LOG_FILE_NAME),
                LogRotation::Daily => tracing_appender::rolling::daily(directory, LOG_FILE_NAME),
                LogRotation::Never => tracing_appender::rolling::never(directory, LOG_FILE_NAME),
            };
            file_logs.format.layer(appender)
        });

        let stdout_layer =
            self.stdout_logs.as_ref().map(|stdout_logs| stdout_logs.format.layer(std::io::stdout));

        let layers: Vec<_> = file_layer.into_iter().chain(stdout_layer).collect();
        let env_filter = env_filter
            .unwrap_or_else(EnvFilter::from_default_env)
            .add_directive(self.global_level.into());

        tracing_subscriber::registry().with(layers).with(env_filter).try_init()
    }
}

/// Initializes tracing for tests. Repeated calls are ignored.
pub fn init_test_tracing() {
    let _ = LogConfig::default().init_tracing_subscriber(None::<EnvFilter>);
}
