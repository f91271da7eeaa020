//! Indexer configuration flags.

use crate::{sink::JsonLinesSink, source::BlockSource};
use anyhow::{Context, Result, bail};
use backon::ExponentialBuilder;
use clap::{Args, ValueEnum};
use kakarot_primitives::{Felt, selector_from_name};
use kakarot_providers_starknet::{
    DEFAULT_BASE_FEE, DEFAULT_GAS_LIMIT, StarknetFieldProvider, StaticFieldProvider,
};
use kakarot_translator::HeaderFieldProvider;
use std::path::PathBuf;
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncWrite, BufReader, BufWriter},
};
use url::Url;

/// Reader of the block stream.
pub type BoxedReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Writer of the record stream.
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Where the coinbase, base fee and gas limit of each block come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum HeaderFieldsMode {
    /// Fixed gas limit and base fee, sequencer address as coinbase.
    #[default]
    Static,
    /// Read from the Kakarot contract over Starknet JSON-RPC.
    Rpc,
}

/// Indexer configuration arguments.
#[derive(Args, Debug, Clone)]
pub struct IndexerArgs {
    /// Starknet JSON-RPC endpoint.
    #[arg(long = "starknet-rpc", env = "STARKNET_NETWORK")]
    pub starknet_rpc: Option<Url>,

    /// Address of the Kakarot contract.
    #[arg(long = "kakarot-address", env = "KAKAROT_ADDRESS", value_parser = parse_felt)]
    pub kakarot_address: Option<Felt>,

    /// Bearer token sent with every RPC request.
    #[arg(long = "auth-token", env = "APIBARA_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// First block to index. Earlier blocks in the input are skipped.
    #[arg(long = "starting-block", env = "STARTING_BLOCK", default_value_t = 0)]
    pub starting_block: u64,

    /// Event selectors to index, as entry point names or `0x` felts.
    #[arg(
        long = "event-selectors",
        env = "EVENT_SELECTORS",
        value_delimiter = ',',
        default_value = "transaction_executed",
        value_parser = parse_selector
    )]
    pub event_selectors: Vec<Felt>,

    /// JSON-lines block input. `-` reads stdin.
    #[arg(long, env = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// JSON-lines record output. `-` writes stdout.
    #[arg(long, env = "OUTPUT", default_value = "-")]
    pub output: PathBuf,

    /// Where the header fields come from.
    #[arg(long = "header-fields", env = "HEADER_FIELDS", default_value = "static")]
    pub header_fields: HeaderFieldsMode,

    /// Block gas limit with `--header-fields static`.
    #[arg(long = "static.gas-limit", env = "STATIC_GAS_LIMIT", default_value_t = DEFAULT_GAS_LIMIT)]
    pub static_gas_limit: u64,

    /// Base fee per gas with `--header-fields static`.
    #[arg(long = "static.base-fee", env = "STATIC_BASE_FEE", default_value_t = DEFAULT_BASE_FEE)]
    pub static_base_fee: u64,

    /// Maximum retries of a header field request, and of a block.
    #[arg(long = "retry.max-times", env = "RETRY_MAX_TIMES", default_value_t = 5)]
    pub retry_max_times: usize,
}

impl IndexerArgs {
    /// Returns the retry policy for header field requests and blocks.
    pub fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default().with_max_times(self.retry_max_times)
    }

    /// Builds the configured [`HeaderFieldProvider`].
    pub fn header_field_provider(&self) -> Result<Box<dyn HeaderFieldProvider>> {
        match self.header_fields {
            HeaderFieldsMode::Static => Ok(Box::new(StaticFieldProvider::new(
                self.static_gas_limit,
                self.static_base_fee,
            ))),
            HeaderFieldsMode::Rpc => {
                let Some(url) = self.starknet_rpc.clone() else {
                    bail!("--starknet-rpc is required with --header-fields rpc");
                };
                let Some(kakarot_address) = self.kakarot_address else {
                    bail!("--kakarot-address is required with --header-fields rpc");
                };
                let provider = StarknetFieldProvider::new_http(
                    url,
                    self.auth_token.as_deref(),
                    kakarot_address,
                    self.retry_policy(),
                )
                .context("Failed to build the Starknet RPC client")?;
                Ok(Box::new(provider))
            }
        }
    }

    /// Opens the block input.
    pub async fn block_source(&self) -> Result<BlockSource<BoxedReader>> {
        let reader: BoxedReader = if is_stdio(&self.input) {
            Box::new(BufReader::new(tokio::io::stdin()))
        } else {
            let file = File::open(&self.input)
                .await
                .with_context(|| format!("Failed to open '{}'", self.input.display()))?;
            Box::new(BufReader::new(file))
        };
        Ok(BlockSource::new(reader, self.starting_block, self.event_selectors.clone()))
    }

    /// Opens the record output.
    pub async fn block_sink(&self) -> Result<JsonLinesSink<BoxedWriter>> {
        let writer: BoxedWriter = if is_stdio(&self.output) {
            Box::new(BufWriter::new(tokio::io::stdout()))
        } else {
            let file = File::create(&self.output)
                .await
                .with_context(|| format!("Failed to create '{}'", self.output.display()))?;
            Box::new(BufWriter::new(file))
        };
        Ok(JsonLinesSink::new(writer))
    }
}

fn is_stdio(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}

/// Parses a `0x`-prefixed felt.
fn parse_felt(value: &str) -> Result<Felt, String> {
    Felt::from_hex(value).map_err(|err| format!("invalid felt '{value}': {err}"))
}

/// Parses a selector given either as a `0x` felt or as an entry point name.
fn parse_selector(value: &str) -> Result<Felt, String> {
    let value = value.trim();
    if value.starts_with("0x") { parse_felt(value) } else { Ok(selector_from_name(value)) }
}
