//! Error types for the `kakarot-translator` crate.
//!
//! Translation failures come in two severities. Transaction- and log-level errors are
//! recoverable: the offending record is dropped, a [`DropReason`] is reported and the block
//! carries on. Block-level errors ([`PipelineError`]) abort the block before any record is
//! emitted, so the caller can retry it as a whole.

use crate::{CalldataError, CodecError, HeaderFieldError, ReceiptError};
use kakarot_primitives::Felt;
use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};
use thiserror::Error;

/// Why a transaction or an event produced no output record.
///
/// The snake_case name is the reason code used in block output, in log fields and as the
/// `reason` label of the drop counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    /// The source transaction has no invoke calldata.
    MissingCalldata,
    /// The invoke bundles more or fewer than one call.
    UnsupportedMultiCall,
    /// The signature does not have five elements.
    InvalidSignatureLength,
    /// A signature element is out of range.
    InvalidSignatureComponent,
    /// The embedded payload is empty.
    EmptyPayload,
    /// The embedded payload has an unsupported EIP-2718 type.
    UnsupportedTransactionType,
    /// The embedded payload is not valid RLP.
    Rlp,
    /// The signature `v` is invalid for the transaction type.
    InvalidSignatureV,
    /// The signature `s` is above half the curve order.
    NonCanonicalSignature,
    /// No signer can be recovered from the signature.
    InvalidSignature,
    /// The upstream receipt does not report gas used.
    MissingGasUsed,
    /// Gas accounting overflowed.
    GasOverflow,
    /// The source transaction was already translated earlier in the block.
    DuplicateTransaction,
    /// The event is a Kakarot protocol event, not an EVM log. Filtered, not invalid.
    ProtocolEvent,
    /// The event key list is empty or has an even length.
    InvalidKeyCount,
    /// The event address key exceeds 160 bits.
    AddressOverflow,
    /// A topic half exceeds 128 bits.
    TopicOverflow,
    /// The event carries more than four topics.
    TooManyTopics,
    /// An event data element exceeds one byte.
    DataOverflow,
}

impl DropReason {
    /// Returns `true` if the drop is intentional filtering rather than a rejection of invalid
    /// input.
    pub const fn is_filtered(&self) -> bool {
        matches!(self, Self::ProtocolEvent | Self::DuplicateTransaction)
    }
}

/// A transaction-level error. The transaction, its logs and its receipt are all dropped.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The invoke calldata or signature could not be decoded.
    #[error(transparent)]
    Calldata(#[from] CalldataError),
    /// The embedded transaction could not be decoded or signed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The receipt could not be assembled.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
    /// The source transaction was already delivered earlier in this block.
    #[error("source transaction {0:#x} already delivered in this block")]
    Duplicate(Felt),
}

impl TransactionError {
    /// Returns the drop reason reported for this error.
    pub const fn reason(&self) -> DropReason {
        match self {
            Self::Calldata(err) => err.reason(),
            Self::Codec(err) => err.reason(),
            Self::Receipt(err) => err.reason(),
            Self::Duplicate(_) => DropReason::DuplicateTransaction,
        }
    }
}

/// A block-level error. No record of the block is emitted.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The per-block header fields could not be fetched.
    ///
    /// Coinbase, base fee and gas limit have no safe default once a remote source is
    /// configured, so the block is failed instead of being assembled with guessed values.
    #[error("failed to fetch header fields: {0}")]
    HeaderFields(#[from] HeaderFieldError),
}

/// Result type alias for block-level operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_drop_reason_codes() {
        let code: &'static str = DropReason::UnsupportedMultiCall.into();
        assert_eq!(code, "unsupported_multi_call");
        assert_eq!(DropReason::InvalidSignatureLength.to_string(), "invalid_signature_length");
        assert_eq!(
            serde_json::to_string(&DropReason::ProtocolEvent).unwrap(),
            r#""protocol_event""#
        );
    }

    #[test]
    fn test_drop_reason_codes_unique() {
        let mut codes: Vec<&'static str> = DropReason::iter().map(Into::into).collect();
        let total = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn test_only_protocol_and_duplicates_are_filtered() {
        let filtered: Vec<_> = DropReason::iter().filter(DropReason::is_filtered).collect();
        assert_eq!(filtered, vec![DropReason::DuplicateTransaction, DropReason::ProtocolEvent]);
    }
}
