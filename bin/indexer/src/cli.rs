//! Contains the indexer CLI.

use crate::{flags::IndexerArgs, metrics::VersionInfo, service::Indexer};
use anyhow::Result;
use clap::Parser;
use kakarot_cli::{LogArgs, LogConfig, MetricsArgs, cli_styles};
use tracing::info;

/// CLI for the Kakarot indexer.
#[derive(Parser, Debug)]
#[command(name = "kakarot-indexer", about = "Indexes Kakarot blocks into Ethereum records", styles = cli_styles())]
pub struct Cli {
    /// Global args
    #[command(flatten)]
    pub global: LogArgs,

    /// Prometheus metrics args
    #[command(flatten)]
    pub metrics: MetricsArgs,

    /// Indexer args
    #[command(flatten)]
    pub indexer: IndexerArgs,
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<()> {
        Self::init_logs(&self.global)?;

        Self::run_until_ctrl_c(async move {
            self.metrics.init_metrics()?;
            if self.metrics.enabled {
                kakarot_translator::Metrics::init();
                VersionInfo::from_build().register_version_metrics();
            }

            let provider = self.indexer.header_field_provider()?;
            let source = self.indexer.block_source().await?;
            let sink = self.indexer.block_sink().await?;
            let indexer = Indexer::new(provider, source, sink, self.indexer.retry_policy());

            tokio::select! {
                res = indexer.run() => {
                    res?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!(target: "indexer", "Ctrl+C received, stopping");
                }
            }
            Ok(())
        })
    }

    /// Run until ctrl-c is pressed.
    pub fn run_until_ctrl_c<F>(fut: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        let rt = Self::tokio_runtime().map_err(|e| anyhow::anyhow!(e))?;
        rt.block_on(fut)
    }

    /// Creates a new default tokio multi-thread [`Runtime`](tokio::runtime::Runtime) with all
    /// features enabled
    pub fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }

    /// Initializes the tracing subscriber.
    pub fn init_logs(args: &LogArgs) -> Result<()> {
        let filter = tracing_subscriber::EnvFilter::from_default_env();
        LogConfig::new(args.clone()).init_tracing_subscriber(Some(filter))?;
        Ok(())
    }
}
