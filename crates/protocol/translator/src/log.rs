//! Translation of Kakarot events into Ethereum logs.
//!
//! An EVM `LOGn` executed by Kakarot is emitted as a Starknet event whose first key is the
//! emitting EVM address and whose remaining keys are the topics, each split into a
//! `(low, high)` pair of 128-bit felts. Every data felt holds a single byte.

use crate::errors::DropReason;
use alloy_primitives::{Address, B256, Bytes, Log, LogData};
use kakarot_primitives::{
    Felt,
    felt::{felt_to_address, felt_to_u8, u256_from_halves},
    selector_from_name,
};
use lazy_static::lazy_static;
use thiserror::Error;

/// Maximum number of topics of an Ethereum log.
pub const MAX_TOPICS: usize = 4;

lazy_static! {
    /// Selectors of events emitted by the Kakarot protocol itself rather than by EVM code.
    pub static ref PROTOCOL_EVENT_SELECTORS: [Felt; 4] = [
        selector_from_name("transaction_executed"),
        selector_from_name("evm_contract_deployed"),
        selector_from_name("Transfer"),
        selector_from_name("Approval"),
    ];
}

/// Errors raised while translating an event into a log.
///
/// A log error drops that log only. The owning transaction and its other logs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The event is a Kakarot protocol event and never maps to a log.
    #[error("protocol event {0:#x}")]
    ProtocolEvent(Felt),
    /// The key list is empty or, after the address, does not pair up.
    #[error("invalid key count {0}, expected an odd number")]
    InvalidKeyCount(usize),
    /// The address key does not fit in 160 bits.
    #[error("address key {0:#x} exceeds 160 bits")]
    AddressOverflow(Felt),
    /// A topic half does not fit in 128 bits.
    #[error("topic {0} has a half exceeding 128 bits")]
    TopicOverflow(usize),
    /// The event carries more than [`MAX_TOPICS`] topics.
    #[error("too many topics: {0}")]
    TooManyTopics(usize),
    /// A data element is not a single byte.
    #[error("data element {0} exceeds one byte")]
    DataOverflow(usize),
}

impl LogError {
    /// Returns the drop reason reported for this error.
    pub const fn reason(&self) -> DropReason {
        match self {
            Self::ProtocolEvent(_) => DropReason::ProtocolEvent,
            Self::InvalidKeyCount(_) => DropReason::InvalidKeyCount,
            Self::AddressOverflow(_) => DropReason::AddressOverflow,
            Self::TopicOverflow(_) => DropReason::TopicOverflow,
            Self::TooManyTopics(_) => DropReason::TooManyTopics,
            Self::DataOverflow(_) => DropReason::DataOverflow,
        }
    }
}

/// Returns `true` if the first key of `keys` is a Kakarot protocol event selector.
pub fn is_protocol_event(keys: &[Felt]) -> bool {
    keys.first().is_some_and(|selector| PROTOCOL_EVENT_SELECTORS.contains(selector))
}

/// Translates the keys and data of a Kakarot event into an Ethereum log.
pub fn translate_event(keys: &[Felt], data: &[Felt]) -> Result<Log, LogError> {
    if is_protocol_event(keys) {
        return Err(LogError::ProtocolEvent(keys[0]));
    }

    let [address, topic_keys @ ..] = keys else {
        return Err(LogError::InvalidKeyCount(0));
    };
    if topic_keys.len() % 2 != 0 {
        return Err(LogError::InvalidKeyCount(keys.len()));
    }

    let address: Address = felt_to_address(address).ok_or(LogError::AddressOverflow(*address))?;

    let topic_count = topic_keys.len() / 2;
    if topic_count > MAX_TOPICS {
        return Err(LogError::TooManyTopics(topic_count));
    }
    let topics = topic_keys
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            u256_from_halves(&pair[0], &pair[1])
                .map(B256::from)
                .ok_or(LogError::TopicOverflow(i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let data = data
        .iter()
        .enumerate()
        .map(|(i, felt)| felt_to_u8(felt).ok_or(LogError::DataOverflow(i)))
        .collect::<Result<Bytes, _>>()?;

    Ok(Log { address, data: LogData::new_unchecked(topics, data) })
}

/// Block and transaction position of a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPosition {
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Number of the containing block.
    pub block_number: u64,
    /// Timestamp of the containing block.
    pub block_timestamp: u64,
    /// Hash of the emitting transaction.
    pub transaction_hash: B256,
    /// Index of the emitting transaction in the block.
    pub transaction_index: u64,
}

impl LogPosition {
    /// Wraps `inner` into its JSON-RPC form at `log_index` within the block.
    pub fn rpc_log(&self, inner: Log, log_index: u64) -> alloy_rpc_types_eth::Log {
        alloy_rpc_types_eth::Log {
            inner,
            block_hash: Some(self.block_hash),
            block_number: Some(self.block_number),
            block_timestamp: Some(self.block_timestamp),
            transaction_hash: Some(self.transaction_hash),
            transaction_index: Some(self.transaction_index),
            log_index: Some(log_index),
            removed: false,
        }
    }
}
