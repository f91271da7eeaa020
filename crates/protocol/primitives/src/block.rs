//! Starknet block data as delivered by the filtered block stream.

use crate::{BlockId, quantity};
use serde::{Deserialize, Serialize};
use starknet_types_core::felt::Felt;

/// The Starknet block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHeader {
    /// Hash of this block.
    pub block_hash: Felt,
    /// Hash of the parent block.
    pub parent_block_hash: Felt,
    /// Height of this block.
    #[serde(with = "quantity")]
    pub block_number: u64,
    /// Address of the sequencer that produced the block.
    pub sequencer_address: Felt,
    /// State root after the block.
    pub new_root: Felt,
    /// Unix timestamp of the block, in seconds.
    #[serde(with = "quantity")]
    pub timestamp: u64,
}

impl SourceHeader {
    /// Returns the identifier used to query per-block parameters for this block.
    pub const fn block_id(&self) -> BlockId {
        BlockId::Hash(self.block_hash)
    }
}

/// One event emitted during a Starknet transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEvent {
    /// Index of the event within the block's event list.
    #[serde(with = "quantity", default)]
    pub index: u64,
    /// Contract that emitted the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<Felt>,
    /// Indexed keys. The first key is the event selector.
    #[serde(default)]
    pub keys: Vec<Felt>,
    /// Unindexed data.
    #[serde(default)]
    pub data: Vec<Felt>,
}

impl SourceEvent {
    /// Returns the event selector, the first key.
    pub fn selector(&self) -> Option<&Felt> {
        self.keys.first()
    }
}

/// Metadata common to every Starknet transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Starknet transaction hash.
    pub hash: Felt,
    /// Account signature over the transaction.
    #[serde(default)]
    pub signature: Vec<Felt>,
}

/// The body of an `INVOKE` v1 transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeTransactionV1 {
    /// Account that sent the transaction.
    pub sender_address: Felt,
    /// Flattened `__execute__` arguments.
    #[serde(default)]
    pub calldata: Vec<Felt>,
}

/// The Starknet transaction that emitted an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTransaction {
    /// Transaction metadata.
    pub meta: TransactionMeta,
    /// Invoke body, absent for every other transaction kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoke_v1: Option<InvokeTransactionV1>,
}

impl SourceTransaction {
    /// Returns the Starknet transaction hash.
    pub const fn hash(&self) -> &Felt {
        &self.meta.hash
    }

    /// Returns the call arguments, if this is an invoke transaction.
    pub fn calldata(&self) -> Option<&[Felt]> {
        self.invoke_v1.as_ref().map(|invoke| invoke.calldata.as_slice())
    }

    /// Returns the account signature.
    pub fn signature(&self) -> &[Felt] {
        &self.meta.signature
    }
}

/// Outcome of a Starknet transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// The transaction executed successfully.
    #[default]
    Succeeded,
    /// The transaction was included but reverted.
    Reverted,
}

/// The Starknet receipt of the transaction that emitted an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReceipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: Felt,
    /// Position of the transaction in the Starknet block.
    #[serde(with = "quantity")]
    pub transaction_index: u64,
    /// Gas consumed by the transaction. Not every upstream provides it.
    #[serde(with = "quantity::opt", default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u128>,
    /// Whether the transaction succeeded or reverted.
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    /// Every event the transaction emitted, in emission order.
    #[serde(default)]
    pub events: Vec<SourceEvent>,
}

/// A filtered event bound to the transaction and receipt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWithTransaction {
    /// The event matching the stream filter.
    pub event: SourceEvent,
    /// The originating transaction.
    pub transaction: SourceTransaction,
    /// The originating receipt.
    pub receipt: SourceReceipt,
}

/// One block of the filtered stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBlock {
    /// Block header.
    pub header: SourceHeader,
    /// Matching events, in delivery order.
    #[serde(default)]
    pub events: Vec<EventWithTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_gas_used_optional() {
        let raw = r#"{
            "transactionHash": "0x1",
            "transactionIndex": "3",
            "events": []
        }"#;
        let receipt: SourceReceipt = serde_json::from_str(raw).unwrap();
        assert_eq!(receipt.gas_used, None);
        assert_eq!(receipt.transaction_index, 3);
        assert_eq!(receipt.execution_status, ExecutionStatus::Succeeded);
    }

    #[test]
    fn test_transaction_accessors() {
        let tx = SourceTransaction {
            meta: TransactionMeta { hash: Felt::from(7u64), signature: vec![Felt::ONE] },
            invoke_v1: None,
        };
        assert_eq!(tx.hash(), &Felt::from(7u64));
        assert_eq!(tx.signature(), &[Felt::ONE]);
        assert!(tx.calldata().is_none());
    }
}
