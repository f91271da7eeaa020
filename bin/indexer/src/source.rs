//! The JSON-lines block source.

use anyhow::{Context, Result};
use kakarot_primitives::{Felt, SourceBlock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

/// Reads one [`SourceBlock`] per line.
///
/// Blocks below the starting block are skipped. Within a block, only the entries whose
/// matched event selector is in the allow-list are kept.
#[derive(Debug)]
pub struct BlockSource<R> {
    lines: Lines<R>,
    line: usize,
    starting_block: u64,
    selectors: Vec<Felt>,
}

impl<R: AsyncBufRead + Unpin> BlockSource<R> {
    /// Creates a source reading from `reader`.
    pub fn new(reader: R, starting_block: u64, selectors: Vec<Felt>) -> Self {
        Self { lines: reader.lines(), line: 0, starting_block, selectors }
    }

    /// Returns the next block to index, or `None` at the end of the input.
    pub async fn next_block(&mut self) -> Result<Option<SourceBlock>> {
        while let Some(line) = self.lines.next_line().await.context("Failed to read block")? {
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut block: SourceBlock = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse block on line {}", self.line))?;
            if block.header.block_number < self.starting_block {
                debug!(
                    target: "indexer",
                    block_number = block.header.block_number,
                    starting_block = self.starting_block,
                    "Skipping block before starting block"
                );
                continue;
            }

            let total = block.events.len();
            block.events.retain(|entry| {
                entry.event.selector().is_some_and(|selector| self.selectors.contains(selector))
            });
            if block.events.len() < total {
                debug!(
                    target: "indexer",
                    block_number = block.header.block_number,
                    skipped = total - block.events.len(),
                    "Skipped events outside the selector allow-list"
                );
            }
            return Ok(Some(block));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakarot_primitives::selector_from_name;
    use kakarot_translator::test_utils::{
        TestSigner, eip1559_tx, source_block, stream_entry, transaction_executed_event,
    };

    fn line(block: &SourceBlock) -> String {
        serde_json::to_string(block).unwrap()
    }

    fn block_with_event(block_number: u64, keys: Vec<Felt>) -> SourceBlock {
        let signer = TestSigner::default();
        let mut entry = stream_entry(
            signer.source_transaction(eip1559_tx().into(), Felt::from(block_number)),
            0,
            Some(21_000),
            vec![transaction_executed_event(0)],
        );
        entry.event.keys = keys;
        source_block(block_number, vec![entry])
    }

    #[tokio::test]
    async fn test_reads_blocks_in_order() {
        let input = format!(
            "{}\n\n{}\n",
            line(&source_block(1, Vec::new())),
            line(&source_block(2, Vec::new()))
        );
        let mut source = BlockSource::new(input.as_bytes(), 0, Vec::new());

        assert_eq!(source.next_block().await.unwrap().unwrap().header.block_number, 1);
        assert_eq!(source.next_block().await.unwrap().unwrap().header.block_number, 2);
        assert!(source.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skips_blocks_before_starting_block() {
        let input = format!(
            "{}\n{}\n",
            line(&source_block(9, Vec::new())),
            line(&source_block(10, Vec::new()))
        );
        let mut source = BlockSource::new(input.as_bytes(), 10, Vec::new());

        assert_eq!(source.next_block().await.unwrap().unwrap().header.block_number, 10);
        assert!(source.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filters_events_by_selector() {
        let executed = selector_from_name("transaction_executed");
        let input = format!(
            "{}\n{}\n",
            line(&block_with_event(1, vec![executed])),
            line(&block_with_event(2, vec![selector_from_name("Transfer")]))
        );
        let mut source = BlockSource::new(input.as_bytes(), 0, vec![executed]);

        assert_eq!(source.next_block().await.unwrap().unwrap().events.len(), 1);
        assert!(source.next_block().await.unwrap().unwrap().events.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_line_reports_position() {
        let input = format!("{}\nnot json\n", line(&source_block(1, Vec::new())));
        let mut source = BlockSource::new(input.as_bytes(), 0, Vec::new());

        source.next_block().await.unwrap();
        let err = source.next_block().await.unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
