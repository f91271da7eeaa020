//! Synthetic Ethereum header assembly.

use crate::accumulator::BlockSeal;
use alloy_consensus::{Header, constants::EMPTY_OMMER_ROOT_HASH};
use alloy_primitives::{Address, B64, B256, Bytes, U256};
use alloy_rlp::Encodable;
use alloy_trie::EMPTY_ROOT_HASH;
use async_trait::async_trait;
use auto_impl::auto_impl;
use core::fmt::Debug;
use kakarot_primitives::{BlockId, SourceHeader, felt::felt_to_b256};
use strum::{Display, EnumIter, IntoStaticStr};
use thiserror::Error;

/// A header field that Starknet headers do not carry and that is read from Kakarot instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum HeaderField {
    /// The block beneficiary.
    Coinbase,
    /// The base fee per gas.
    BaseFee,
    /// The block gas limit.
    GasLimit,
}

impl HeaderField {
    /// Returns the Kakarot entry point that reads this field.
    pub const fn entry_point(&self) -> &'static str {
        match self {
            Self::Coinbase => "get_coinbase",
            Self::BaseFee => "get_base_fee",
            Self::GasLimit => "get_block_gas_limit",
        }
    }
}

/// Errors raised while fetching [`HeaderFields`].
///
/// These errors are fatal to the block being processed: no record of the block is emitted
/// and the block is retried as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderFieldError {
    /// The request for a field failed. Usually transient.
    #[error("request for {field} at block {block} failed: {message}")]
    Request {
        /// The requested field.
        field: HeaderField,
        /// The block the field was requested for.
        block: BlockId,
        /// The transport or remote error.
        message: String,
    },
    /// The response for a field does not have the expected shape.
    #[error("malformed {field} response at block {block}: {message}")]
    Malformed {
        /// The requested field.
        field: HeaderField,
        /// The block the field was requested for.
        block: BlockId,
        /// What is wrong with the response.
        message: String,
    },
    /// The returned value does not fit the header field.
    #[error("{field} value {value} out of range")]
    OutOfRange {
        /// The requested field.
        field: HeaderField,
        /// The returned value.
        value: U256,
    },
}

impl HeaderFieldError {
    /// Returns `true` if retrying the request may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

/// The header fields read from Kakarot for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFields {
    /// The block beneficiary.
    pub coinbase: Address,
    /// The base fee per gas.
    pub base_fee_per_gas: u64,
    /// The block gas limit.
    pub gas_limit: u64,
}

/// Supplies the header fields Starknet headers do not carry.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait HeaderFieldProvider: Debug + Send + Sync {
    /// Returns the coinbase, base fee and gas limit of the block with the given header.
    async fn header_fields(&self, header: &SourceHeader) -> Result<HeaderFields, HeaderFieldError>;
}

/// Assembles the Ethereum header of a block.
///
/// The JSON-RPC `hash` is the Starknet block hash, which is also the `blockHash` of every
/// transaction, log and receipt of the block.
pub fn assemble_header(
    source: &SourceHeader,
    seal: &BlockSeal,
    fields: &HeaderFields,
) -> alloy_rpc_types_eth::Header {
    let inner = Header {
        parent_hash: felt_to_b256(&source.parent_block_hash),
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        beneficiary: fields.coinbase,
        state_root: felt_to_b256(&source.new_root),
        transactions_root: seal.transactions_root,
        receipts_root: seal.receipts_root,
        logs_bloom: seal.logs_bloom,
        difficulty: U256::ZERO,
        number: source.block_number,
        gas_limit: fields.gas_limit,
        gas_used: seal.gas_used,
        timestamp: source.timestamp,
        extra_data: Bytes::new(),
        mix_hash: B256::ZERO,
        nonce: B64::ZERO,
        base_fee_per_gas: Some(fields.base_fee_per_gas),
        withdrawals_root: Some(EMPTY_ROOT_HASH),
        ..Default::default()
    };
    let size = U256::from(inner.length());

    alloy_rpc_types_eth::Header {
        hash: felt_to_b256(&source.block_hash),
        inner,
        total_difficulty: Some(U256::ZERO),
        size: Some(size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::BlockAccumulator;
    use alloy_primitives::{Bloom, address};
    use kakarot_primitives::Felt;

    fn source_header() -> SourceHeader {
        SourceHeader {
            block_hash: Felt::from(0xb10cu64),
            parent_block_hash: Felt::from(0xb10bu64),
            block_number: 42,
            sequencer_address: Felt::from(0x5eu64),
            new_root: Felt::from(0x5707u64),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_entry_points() {
        assert_eq!(HeaderField::Coinbase.entry_point(), "get_coinbase");
        assert_eq!(HeaderField::BaseFee.entry_point(), "get_base_fee");
        assert_eq!(HeaderField::GasLimit.entry_point(), "get_block_gas_limit");
        assert_eq!(HeaderField::GasLimit.to_string(), "gas_limit");
    }

    #[test]
    fn test_empty_block_header() {
        let fields = HeaderFields {
            coinbase: address!("0x00000000000000000000000000000000000000c0"),
            base_fee_per_gas: 100_000_000_000,
            gas_limit: 30_000_000,
        };
        let header = assemble_header(&source_header(), &BlockAccumulator::new().seal(), &fields);

        assert_eq!(header.hash, felt_to_b256(&Felt::from(0xb10cu64)));
        assert_eq!(header.inner.parent_hash, felt_to_b256(&Felt::from(0xb10bu64)));
        assert_eq!(header.inner.state_root, felt_to_b256(&Felt::from(0x5707u64)));
        assert_eq!(header.inner.ommers_hash, EMPTY_OMMER_ROOT_HASH);
        assert_eq!(header.inner.transactions_root, EMPTY_ROOT_HASH);
        assert_eq!(header.inner.receipts_root, EMPTY_ROOT_HASH);
        assert_eq!(header.inner.withdrawals_root, Some(EMPTY_ROOT_HASH));
        assert_eq!(header.inner.logs_bloom, Bloom::ZERO);
        assert_eq!(header.inner.beneficiary, fields.coinbase);
        assert_eq!(header.inner.base_fee_per_gas, Some(100_000_000_000));
        assert_eq!(header.inner.gas_limit, 30_000_000);
        assert_eq!(header.inner.gas_used, 0);
        assert_eq!(header.inner.number, 42);
        assert_eq!(header.inner.timestamp, 1_700_000_000);
        assert_eq!(header.inner.difficulty, U256::ZERO);
        assert!(header.inner.extra_data.is_empty());
    }

    #[test]
    fn test_header_field_error_transience() {
        let block = BlockId::Number(1);
        let request = HeaderFieldError::Request {
            field: HeaderField::BaseFee,
            block,
            message: "connection reset".into(),
        };
        let malformed = HeaderFieldError::Malformed {
            field: HeaderField::BaseFee,
            block,
            message: "empty result".into(),
        };
        assert!(request.is_transient());
        assert!(!malformed.is_transient());
        assert_eq!(
            request.to_string(),
            "request for base_fee at block #1 failed: connection reset"
        );
    }
}
