//! The JSON-lines record sink.

use anyhow::{Context, Result};
use kakarot_translator::BlockOutput;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes one [`StoreItem`](kakarot_translator::StoreItem) per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> JsonLinesSink<W> {
    /// Creates a sink writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the records of a block and flushes them.
    ///
    /// The records of a block are serialized before anything is written.
    pub async fn write_block(&mut self, output: &BlockOutput) -> Result<()> {
        let mut buf = Vec::new();
        for item in &output.items {
            serde_json::to_writer(&mut buf, item).context("Failed to serialize record")?;
            buf.push(b'\n');
        }
        self.writer.write_all(&buf).await.context("Failed to write records")?;
        self.writer.flush().await.context("Failed to flush records")
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
