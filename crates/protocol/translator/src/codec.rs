//! Decoding, signing and re-encoding of embedded Ethereum transactions.

use crate::{calldata::RawSignature, errors::DropReason};
use alloy_consensus::{
    SignableTransaction, Signed, TxEip1559, TxEip2930, TxEnvelope, TxLegacy, TxType,
    transaction::Recovered,
};
use alloy_eips::{eip2718::Encodable2718, eip2930::AccessList};
use alloy_primitives::{Address, B256, Bytes, ChainId, Signature, SignatureError, TxKind, U256};
use alloy_rlp::{Decodable, Header};
use thiserror::Error;

/// Legacy transactions whose replay-protection chain id is at or below this value have it
/// raised to this value before the unsigned body is rebuilt.
pub const MIN_LEGACY_CHAIN_ID: ChainId = 37;

/// Lowest `v` accepted for a legacy transaction (EIP-155 with chain id 0).
pub const EIP155_V_OFFSET: u64 = 35;

/// Errors raised while decoding or signing an embedded transaction.
///
/// Every variant drops the transaction it was raised for, together with its logs and
/// receipt. The rest of the block is unaffected.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The embedded payload is empty.
    #[error("empty transaction payload")]
    EmptyPayload,
    /// The payload carries an EIP-2718 type byte this codec does not handle.
    ///
    /// Only EIP-2930 (`0x01`) and EIP-1559 (`0x02`) typed transactions are supported; blob
    /// and set-code transactions are rejected.
    #[error("unsupported transaction type {0:#04x}")]
    UnsupportedTransactionType(u8),
    /// The payload is not well-formed RLP for its transaction type: a bad header, a field
    /// that fails to decode, a list length mismatch or trailing bytes.
    #[error("malformed transaction RLP: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    /// The `v` value is not valid for the transaction type.
    ///
    /// Legacy transactions require an EIP-155 `v` (35 or above); typed transactions require a
    /// y-parity of 0 or 1.
    #[error("invalid signature v value {0}")]
    InvalidSignatureV(u64),
    /// The signature `s` is in the upper half of the curve order (EIP-2).
    #[error("non-canonical signature: s exceeds half the curve order")]
    NonCanonicalSignature,
    /// No signer can be recovered from the signature.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
}

impl CodecError {
    /// Returns the drop reason reported for this error.
    pub const fn reason(&self) -> DropReason {
        match self {
            Self::EmptyPayload => DropReason::EmptyPayload,
            Self::UnsupportedTransactionType(_) => DropReason::UnsupportedTransactionType,
            Self::Rlp(_) => DropReason::Rlp,
            Self::InvalidSignatureV(_) => DropReason::InvalidSignatureV,
            Self::NonCanonicalSignature => DropReason::NonCanonicalSignature,
            Self::InvalidSignature(_) => DropReason::InvalidSignature,
        }
    }
}

/// An embedded transaction decoded from its unsigned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignedTransaction {
    /// A legacy transaction, with or without an EIP-155 chain id in its body.
    Legacy(TxLegacy),
    /// An EIP-2930 access-list transaction.
    AccessList(TxEip2930),
    /// An EIP-1559 fee-market transaction.
    FeeMarket(TxEip1559),
}

impl UnsignedTransaction {
    /// Decodes an unsigned payload.
    ///
    /// A leading byte at or below `0x7f` is an EIP-2718 type byte. A leading byte at or above
    /// `0xc0` opens the RLP list of a legacy transaction.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let (&first, body) = payload.split_first().ok_or(CodecError::EmptyPayload)?;

        let mut buf = body;
        let tx = match first {
            0x01 => Self::AccessList(decode_eip2930(&mut buf)?),
            0x02 => Self::FeeMarket(decode_eip1559(&mut buf)?),
            ty @ 0x00..=0x7f => return Err(CodecError::UnsupportedTransactionType(ty)),
            0xc0..=0xff => {
                buf = payload;
                Self::Legacy(decode_legacy(&mut buf)?)
            }
            _ => return Err(alloy_rlp::Error::UnexpectedString.into()),
        };

        if !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength.into());
        }
        Ok(tx)
    }

    /// Returns the EIP-2718 type of the transaction.
    pub const fn tx_type(&self) -> TxType {
        match self {
            Self::Legacy(_) => TxType::Legacy,
            Self::AccessList(_) => TxType::Eip2930,
            Self::FeeMarket(_) => TxType::Eip1559,
        }
    }

    /// Attaches the detached signature.
    ///
    /// For legacy transactions the chain id and y-parity are both derived from the EIP-155
    /// `v`, so that the re-encoded `v` equals the supplied one. Signatures with a high `s` are
    /// rejected, so a transaction has a single valid encoding.
    pub fn into_signed(self, signature: RawSignature) -> Result<TypedTransaction, CodecError> {
        let RawSignature { r, s, v } = signature;
        let canonical = |parity: bool| {
            let signature = Signature::new(r, s, parity);
            match signature.normalize_s() {
                Some(_) => Err(CodecError::NonCanonicalSignature),
                None => Ok(signature),
            }
        };
        let signed = match self {
            Self::Legacy(mut tx) => {
                if v < EIP155_V_OFFSET {
                    return Err(CodecError::InvalidSignatureV(v));
                }
                let chain_id = (v - EIP155_V_OFFSET) / 2;
                let parity = (v - EIP155_V_OFFSET) % 2 == 1;
                if tx.chain_id.is_some_and(|body_chain_id| body_chain_id != chain_id) {
                    debug!(
                        target: "translator::codec",
                        body_chain_id = ?tx.chain_id,
                        chain_id,
                        "Legacy chain id taken from signature v"
                    );
                }
                tx.chain_id = Some(chain_id);
                TypedTransaction::Legacy(tx.into_signed(canonical(parity)?))
            }
            Self::AccessList(tx) => {
                let parity = y_parity(v)?;
                TypedTransaction::AccessList(tx.into_signed(canonical(parity)?))
            }
            Self::FeeMarket(tx) => {
                let parity = y_parity(v)?;
                TypedTransaction::FeeMarket(tx.into_signed(canonical(parity)?))
            }
        };
        Ok(signed)
    }
}

impl From<TxLegacy> for UnsignedTransaction {
    fn from(tx: TxLegacy) -> Self {
        Self::Legacy(tx)
    }
}

impl From<TxEip2930> for UnsignedTransaction {
    fn from(tx: TxEip2930) -> Self {
        Self::AccessList(tx)
    }
}

impl From<TxEip1559> for UnsignedTransaction {
    fn from(tx: TxEip1559) -> Self {
        Self::FeeMarket(tx)
    }
}

/// A signed Ethereum transaction of one of the supported types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedTransaction {
    /// A signed legacy transaction.
    Legacy(Signed<TxLegacy>),
    /// A signed EIP-2930 transaction.
    AccessList(Signed<TxEip2930>),
    /// A signed EIP-1559 transaction.
    FeeMarket(Signed<TxEip1559>),
}

impl TypedTransaction {
    /// Decodes, signs and recovers the sender of an embedded transaction.
    pub fn decode_signed(
        payload: &[u8],
        signature: RawSignature,
    ) -> Result<Recovered<Self>, CodecError> {
        let tx = UnsignedTransaction::decode(payload)?.into_signed(signature)?;
        let signer = tx.recover_signer()?;
        Ok(Recovered::new_unchecked(tx, signer))
    }

    /// Returns the transaction hash: keccak256 of the EIP-2718 encoding.
    pub fn hash(&self) -> B256 {
        match self {
            Self::Legacy(tx) => *tx.hash(),
            Self::AccessList(tx) => *tx.hash(),
            Self::FeeMarket(tx) => *tx.hash(),
        }
    }

    /// Returns the EIP-2718 type of the transaction.
    pub const fn tx_type(&self) -> TxType {
        match self {
            Self::Legacy(_) => TxType::Legacy,
            Self::AccessList(_) => TxType::Eip2930,
            Self::FeeMarket(_) => TxType::Eip1559,
        }
    }

    /// Recovers the sender from the signature.
    pub fn recover_signer(&self) -> Result<Address, SignatureError> {
        match self {
            Self::Legacy(tx) => tx.recover_signer(),
            Self::AccessList(tx) => tx.recover_signer(),
            Self::FeeMarket(tx) => tx.recover_signer(),
        }
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        match self {
            Self::Legacy(tx) => tx.signature(),
            Self::AccessList(tx) => tx.signature(),
            Self::FeeMarket(tx) => tx.signature(),
        }
    }

    /// Returns the chain id, if the transaction is replay protected.
    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            Self::Legacy(tx) => tx.tx().chain_id,
            Self::AccessList(tx) => Some(tx.tx().chain_id),
            Self::FeeMarket(tx) => Some(tx.tx().chain_id),
        }
    }

    /// Returns the sender nonce.
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.tx().nonce,
            Self::AccessList(tx) => tx.tx().nonce,
            Self::FeeMarket(tx) => tx.tx().nonce,
        }
    }

    /// Returns the gas limit.
    pub fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.tx().gas_limit,
            Self::AccessList(tx) => tx.tx().gas_limit,
            Self::FeeMarket(tx) => tx.tx().gas_limit,
        }
    }

    /// Returns the recipient, or [`TxKind::Create`] for contract creations.
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Legacy(tx) => tx.tx().to,
            Self::AccessList(tx) => tx.tx().to,
            Self::FeeMarket(tx) => tx.tx().to,
        }
    }

    /// Returns the transferred value.
    pub fn value(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.tx().value,
            Self::AccessList(tx) => tx.tx().value,
            Self::FeeMarket(tx) => tx.tx().value,
        }
    }

    /// Returns the call input.
    pub fn input(&self) -> &Bytes {
        match self {
            Self::Legacy(tx) => &tx.tx().input,
            Self::AccessList(tx) => &tx.tx().input,
            Self::FeeMarket(tx) => &tx.tx().input,
        }
    }

    /// Returns the gas price actually paid per unit of gas under `base_fee`.
    ///
    /// Legacy and EIP-2930 transactions pay their gas price. EIP-1559 transactions pay
    /// `min(max_fee_per_gas, base_fee + max_priority_fee_per_gas)`.
    pub fn effective_gas_price(&self, base_fee: u64) -> u128 {
        match self {
            Self::Legacy(tx) => tx.tx().gas_price,
            Self::AccessList(tx) => tx.tx().gas_price,
            Self::FeeMarket(tx) => {
                let tx = tx.tx();
                let tip_cap = (base_fee as u128).saturating_add(tx.max_priority_fee_per_gas);
                tx.max_fee_per_gas.min(tip_cap)
            }
        }
    }

    /// Returns the address of the contract this transaction deploys, if it is a creation.
    pub fn contract_address(&self, sender: Address) -> Option<Address> {
        self.kind().is_create().then(|| sender.create(self.nonce()))
    }

    /// Returns the EIP-2718 encoding: the type byte followed by the RLP body, or the bare RLP
    /// list for legacy transactions.
    pub fn encoded_2718(&self) -> Vec<u8> {
        TxEnvelope::from(self.clone()).encoded_2718()
    }
}

impl From<TypedTransaction> for TxEnvelope {
    fn from(tx: TypedTransaction) -> Self {
        match tx {
            TypedTransaction::Legacy(tx) => Self::Legacy(tx),
            TypedTransaction::AccessList(tx) => Self::Eip2930(tx),
            TypedTransaction::FeeMarket(tx) => Self::Eip1559(tx),
        }
    }
}

/// Maps a typed-transaction `v` to its y-parity.
const fn y_parity(v: u64) -> Result<bool, CodecError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CodecError::InvalidSignatureV(v)),
    }
}

/// Decodes an RLP list header and returns the list payload, advancing `buf` past it.
fn list_payload<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<&'a [u8]> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(payload)
}

/// Fails if a list payload has fields left over after decoding.
const fn finish(body: &[u8]) -> alloy_rlp::Result<()> {
    if body.is_empty() { Ok(()) } else { Err(alloy_rlp::Error::UnexpectedLength) }
}

/// Decodes the unsigned legacy list: six fields, or nine with an EIP-155 chain id and two
/// empty signature placeholders.
fn decode_legacy(buf: &mut &[u8]) -> alloy_rlp::Result<TxLegacy> {
    let mut body = list_payload(buf)?;
    let mut tx = TxLegacy {
        chain_id: None,
        nonce: Decodable::decode(&mut body)?,
        gas_price: Decodable::decode(&mut body)?,
        gas_limit: Decodable::decode(&mut body)?,
        to: Decodable::decode(&mut body)?,
        value: Decodable::decode(&mut body)?,
        input: Decodable::decode(&mut body)?,
    };

    if !body.is_empty() {
        let chain_id = ChainId::decode(&mut body)?;
        let _r = U256::decode(&mut body)?;
        let _s = U256::decode(&mut body)?;
        tx.chain_id = Some(chain_id.max(MIN_LEGACY_CHAIN_ID));
    }

    finish(body)?;
    Ok(tx)
}

fn decode_eip2930(buf: &mut &[u8]) -> alloy_rlp::Result<TxEip2930> {
    let mut body = list_payload(buf)?;
    let tx = TxEip2930 {
        chain_id: Decodable::decode(&mut body)?,
        nonce: Decodable::decode(&mut body)?,
        gas_price: Decodable::decode(&mut body)?,
        gas_limit: Decodable::decode(&mut body)?,
        to: Decodable::decode(&mut body)?,
        value: Decodable::decode(&mut body)?,
        input: Decodable::decode(&mut body)?,
        access_list: AccessList::decode(&mut body)?,
    };
    finish(body)?;
    Ok(tx)
}

fn decode_eip1559(buf: &mut &[u8]) -> alloy_rlp::Result<TxEip1559> {
    let mut body = list_payload(buf)?;
    let tx = TxEip1559 {
        chain_id: Decodable::decode(&mut body)?,
        nonce: Decodable::decode(&mut body)?,
        max_priority_fee_per_gas: Decodable::decode(&mut body)?,
        max_fee_per_gas: Decodable::decode(&mut body)?,
        gas_limit: Decodable::decode(&mut body)?,
        to: Decodable::decode(&mut body)?,
        value: Decodable::decode(&mut body)?,
        input: Decodable::decode(&mut body)?,
        access_list: AccessList::decode(&mut body)?,
    };
    finish(body)?;
    Ok(tx)
}
