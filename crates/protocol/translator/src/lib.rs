#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod accumulator;
pub use accumulator::{BlockAccumulator, BlockSeal, FoldedTransaction};

pub mod calldata;
pub use calldata::{CalldataError, EmbeddedTransaction, RawSignature, decode_calldata};

pub mod codec;
pub use codec::{CodecError, TypedTransaction, UnsignedTransaction};

mod errors;
pub use errors::{DropReason, PipelineError, PipelineResult, TransactionError};

mod header;
pub use header::{
    HeaderField, HeaderFieldError, HeaderFieldProvider, HeaderFields, assemble_header,
};

mod item;
pub use item::StoreItem;

pub mod log;
pub use log::{LogError, LogPosition, translate_event};

mod pipeline;
pub use pipeline::{BlockOutput, BlockPipeline, DroppedRecord, translate_block};

mod receipt;
pub use receipt::{GasCharge, ReceiptContext, ReceiptError, receipt_envelope};

mod trie;
pub use trie::OrderedTrie;

#[cfg(feature = "metrics")]
mod metrics;
#[cfg(feature = "metrics")]
pub use metrics::Metrics;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
