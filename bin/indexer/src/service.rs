//! The indexer run loop.

use crate::{sink::JsonLinesSink, source::BlockSource};
use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use kakarot_translator::{BlockPipeline, HeaderFieldProvider};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{info, warn};

/// Reads blocks from a [`BlockSource`], translates them and writes the records to a
/// [`JsonLinesSink`].
///
/// Blocks are processed one at a time, in input order. A block that fails is retried as a
/// whole; nothing is written for it until it succeeds.
#[derive(Debug)]
pub struct Indexer<P, R, W> {
    pipeline: BlockPipeline<P>,
    source: BlockSource<R>,
    sink: JsonLinesSink<W>,
    retry: ExponentialBuilder,
}

impl<P, R, W> Indexer<P, R, W>
where
    P: HeaderFieldProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates an indexer.
    pub const fn new(
        provider: P,
        source: BlockSource<R>,
        sink: JsonLinesSink<W>,
        retry: ExponentialBuilder,
    ) -> Self {
        Self { pipeline: BlockPipeline::new(provider), source, sink, retry }
    }

    /// Runs until the input is exhausted, and returns the sink.
    pub async fn run(mut self) -> Result<JsonLinesSink<W>> {
        let mut blocks = 0u64;
        while let Some(block) = self.source.next_block().await? {
            let pipeline = &self.pipeline;
            let source_block = &block;
            let output = (|| pipeline.process_block(source_block))
                .retry(self.retry)
                .notify(|err, duration| {
                    warn!(
                        target: "indexer",
                        block_number = source_block.header.block_number,
                        %err,
                        "Retrying block after {duration:?}"
                    );
                })
                .await
                .with_context(|| {
                    format!("Failed to process block {}", block.header.block_number)
                })?;

            self.sink.write_block(&output).await?;
            blocks += 1;
        }

        info!(target: "indexer", blocks, "Input exhausted");
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kakarot_primitives::{BlockId, Felt, SourceHeader, selector_from_name};
    use kakarot_translator::{
        HeaderField, HeaderFieldError, HeaderFields,
        test_utils::{
            FixedFields, TestSigner, eip1559_tx, source_block, stream_entry,
            transaction_executed_event,
        },
    };
    use serde_json::Value;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    /// Fails the first `failures` requests.
    #[derive(Debug)]
    struct FlakyFields {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HeaderFieldProvider for FlakyFields {
        async fn header_fields(
            &self,
            header: &SourceHeader,
        ) -> Result<HeaderFields, HeaderFieldError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(HeaderFieldError::Request {
                    field: HeaderField::BaseFee,
                    block: BlockId::Hash(header.block_hash),
                    message: "unavailable".into(),
                });
            }
            Ok(FixedFields::default().0)
        }
    }

    fn retry(max_times: usize) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
            .with_max_times(max_times)
    }

    fn input() -> String {
        let signer = TestSigner::default();
        let mut lines = String::new();
        for block_number in 1..=2u64 {
            let mut tx = eip1559_tx();
            tx.nonce = block_number;
            let entry = stream_entry(
                signer.source_transaction(tx.into(), Felt::from(block_number)),
                0,
                Some(21_000),
                vec![transaction_executed_event(0)],
            );
            let block = source_block(block_number, vec![entry]);
            lines.push_str(&serde_json::to_string(&block).unwrap());
            lines.push('\n');
        }
        lines
    }

    fn collections(written: &[u8]) -> Vec<String> {
        String::from_utf8(written.to_vec())
            .unwrap()
            .lines()
            .map(|line| {
                let value: Value = serde_json::from_str(line).unwrap();
                value["collection"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_indexes_all_blocks() {
        let input = input();
        let source =
            BlockSource::new(input.as_bytes(), 0, vec![selector_from_name("transaction_executed")]);
        let indexer =
            Indexer::new(FixedFields::default(), source, JsonLinesSink::new(Vec::new()), retry(0));

        let written = indexer.run().await.unwrap().into_inner();
        assert_eq!(
            collections(&written),
            vec!["transactions", "receipts", "headers", "transactions", "receipts", "headers"]
        );
    }

    #[tokio::test]
    async fn test_failed_block_is_retried_whole() {
        let input = input();
        let source =
            BlockSource::new(input.as_bytes(), 2, vec![selector_from_name("transaction_executed")]);
        let provider = FlakyFields { failures: 2, calls: AtomicUsize::new(0) };
        let indexer = Indexer::new(provider, source, JsonLinesSink::new(Vec::new()), retry(2));

        let written = indexer.run().await.unwrap().into_inner();
        assert_eq!(collections(&written), vec!["transactions", "receipts", "headers"]);
    }

    #[tokio::test]
    async fn test_exhausted_retries_stop_the_indexer() {
        let input = input();
        let source =
            BlockSource::new(input.as_bytes(), 0, vec![selector_from_name("transaction_executed")]);
        let provider = FlakyFields { failures: usize::MAX, calls: AtomicUsize::new(0) };
        let indexer = Indexer::new(provider, source, JsonLinesSink::new(Vec::new()), retry(1));

        let err = indexer.run().await.unwrap_err();
        assert!(err.to_string().contains("Failed to process block 1"));
    }
}
