//! Per-block accumulation of tries, bloom and gas.

use crate::{
    receipt::{GasCharge, ReceiptError},
    trie::OrderedTrie,
};
use alloy_primitives::{B256, Bloom};

/// Block-scoped state threaded through the ordered fold over a block's transactions.
///
/// Transactions are folded strictly in delivery order: the `i`-th folded transaction and its
/// receipt land under trie key `rlp(i)`, and the cumulative gas after it is the sum of the gas
/// of transactions `0..=i`. The accumulator is consumed by [`BlockAccumulator::seal`].
#[derive(Debug, Default)]
pub struct BlockAccumulator {
    transactions: OrderedTrie,
    receipts: OrderedTrie,
    logs_bloom: Bloom,
    cumulative_gas_used: u64,
    log_count: u64,
}

/// The aggregate values read from a sealed [`BlockAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSeal {
    /// Root of the transaction trie.
    pub transactions_root: B256,
    /// Root of the receipt trie.
    pub receipts_root: B256,
    /// Bitwise OR of every folded receipt bloom.
    pub logs_bloom: Bloom,
    /// Cumulative gas used after the last folded transaction.
    pub gas_used: u64,
    /// Number of folded transactions.
    pub transaction_count: u64,
}

/// One transaction's contribution to the block.
#[derive(Debug, Clone)]
pub struct FoldedTransaction {
    /// EIP-2718 encoding of the signed transaction.
    pub encoded_transaction: Vec<u8>,
    /// EIP-2718 encoding of its receipt.
    pub encoded_receipt: Vec<u8>,
    /// Bloom of the receipt.
    pub logs_bloom: Bloom,
    /// Gas charged to the transaction.
    pub gas: GasCharge,
    /// Number of logs in the receipt.
    pub log_count: u64,
}

impl BlockAccumulator {
    /// Creates an accumulator for a new block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index the next folded transaction will get.
    pub fn next_transaction_index(&self) -> u64 {
        self.transactions.len() as u64
    }

    /// Returns the block-wide index the next log will get.
    pub const fn next_log_index(&self) -> u64 {
        self.log_count
    }

    /// Returns the cumulative gas used so far.
    pub const fn cumulative_gas_used(&self) -> u64 {
        self.cumulative_gas_used
    }

    /// Computes the gas charge of the next transaction without folding it.
    pub fn charge(&self, gas_used: Option<u128>) -> Result<GasCharge, ReceiptError> {
        GasCharge::new(self.cumulative_gas_used, gas_used)
    }

    /// Folds a transaction and its receipt into the block.
    ///
    /// `folded.gas` must have been computed by [`BlockAccumulator::charge`] against the current
    /// state of this accumulator.
    pub fn fold(&mut self, folded: FoldedTransaction) -> u64 {
        debug_assert!(folded.gas.cumulative_gas_used >= self.cumulative_gas_used);
        let index = self.transactions.push(folded.encoded_transaction);
        self.receipts.push(folded.encoded_receipt);
        self.logs_bloom |= folded.logs_bloom;
        self.cumulative_gas_used = folded.gas.cumulative_gas_used;
        self.log_count += folded.log_count;
        index
    }

    /// Consumes the accumulator and computes the trie roots.
    pub fn seal(self) -> BlockSeal {
        let transaction_count = self.transactions.len() as u64;
        BlockSeal {
            transactions_root: self.transactions.root(),
            receipts_root: self.receipts.root(),
            logs_bloom: self.logs_bloom,
            gas_used: self.cumulative_gas_used,
            transaction_count,
        }
    }
}
