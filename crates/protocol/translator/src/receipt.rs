//! Receipt assembly.

use crate::errors::DropReason;
use alloy_consensus::{Eip658Value, Receipt, ReceiptEnvelope, ReceiptWithBloom, TxType};
use alloy_primitives::{Address, B256, Bloom};
use alloy_rpc_types_eth::TransactionReceipt;
use thiserror::Error;

/// Errors raised while assembling a receipt.
///
/// Receipt errors are raised before any record of the transaction is emitted, so the
/// transaction, its logs and its receipt are withheld together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    /// The upstream receipt does not report the gas used by the transaction.
    #[error("upstream receipt has no gas used")]
    MissingGasUsed,
    /// Adding the transaction's gas to the block's cumulative gas overflows.
    #[error("cumulative gas overflow: {cumulative} + {gas_used}")]
    GasOverflow {
        /// Cumulative gas before the transaction.
        cumulative: u64,
        /// Gas used by the transaction.
        gas_used: u128,
    },
}

impl ReceiptError {
    /// Returns the drop reason reported for this error.
    pub const fn reason(&self) -> DropReason {
        match self {
            Self::MissingGasUsed => DropReason::MissingGasUsed,
            Self::GasOverflow { .. } => DropReason::GasOverflow,
        }
    }
}

/// Gas charged to one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCharge {
    /// Gas used by the transaction.
    pub gas_used: u64,
    /// Cumulative gas of the block including the transaction.
    pub cumulative_gas_used: u64,
}

impl GasCharge {
    /// Charges `gas_used` on top of `cumulative` gas.
    pub fn new(cumulative: u64, gas_used: Option<u128>) -> Result<Self, ReceiptError> {
        let gas_used = gas_used.ok_or(ReceiptError::MissingGasUsed)?;
        let overflow = ReceiptError::GasOverflow { cumulative, gas_used };
        let gas_used = u64::try_from(gas_used).map_err(|_| overflow.clone())?;
        let cumulative_gas_used = cumulative.checked_add(gas_used).ok_or(overflow)?;
        Ok(Self { gas_used, cumulative_gas_used })
    }
}

/// Builds the receipt envelope of a transaction of type `tx_type`.
///
/// `logs_bloom` must be the bloom of `logs`. It is passed in so the same bloom serves both the
/// consensus receipt and its JSON-RPC counterpart, whose log types differ.
pub fn receipt_envelope<T>(
    tx_type: TxType,
    status: bool,
    cumulative_gas_used: u64,
    logs: Vec<T>,
    logs_bloom: Bloom,
) -> ReceiptEnvelope<T> {
    let receipt = Receipt { status: Eip658Value::Eip658(status), cumulative_gas_used, logs };
    let receipt = ReceiptWithBloom { receipt, logs_bloom };
    match tx_type {
        TxType::Legacy => ReceiptEnvelope::Legacy(receipt),
        TxType::Eip2930 => ReceiptEnvelope::Eip2930(receipt),
        TxType::Eip1559 => ReceiptEnvelope::Eip1559(receipt),
        TxType::Eip4844 => ReceiptEnvelope::Eip4844(receipt),
        TxType::Eip7702 => ReceiptEnvelope::Eip7702(receipt),
    }
}

/// Transaction-level fields of a JSON-RPC receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptContext {
    /// Hash of the Ethereum transaction.
    pub transaction_hash: B256,
    /// Position of the transaction in the block.
    pub transaction_index: u64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Number of the containing block.
    pub block_number: u64,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
    /// Price paid per unit of gas.
    pub effective_gas_price: u128,
    /// Recovered sender.
    pub from: Address,
    /// Recipient, `None` for contract creations.
    pub to: Option<Address>,
    /// Address of the deployed contract, for contract creations.
    pub contract_address: Option<Address>,
}

impl ReceiptContext {
    /// Wraps a receipt envelope into its JSON-RPC form.
    pub fn rpc_receipt<T>(&self, inner: T) -> TransactionReceipt<T> {
        TransactionReceipt {
            inner,
            transaction_hash: self.transaction_hash,
            transaction_index: Some(self.transaction_index),
            block_hash: Some(self.block_hash),
            block_number: Some(self.block_number),
            gas_used: self.gas_used,
            effective_gas_price: self.effective_gas_price,
            blob_gas_used: None,
            blob_gas_price: None,
            from: self.from,
            to: self.to,
            contract_address: self.contract_address,
        }
    }
}
