#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use starknet_types_core::felt::Felt;

mod block;
pub use block::{
    EventWithTransaction, ExecutionStatus, InvokeTransactionV1, SourceBlock, SourceEvent,
    SourceHeader, SourceReceipt, SourceTransaction, TransactionMeta,
};

mod block_id;
pub use block_id::BlockId;

pub mod felt;
pub use felt::{selector_from_name, sn_keccak};

pub mod hex;

pub mod quantity;
