//! Extraction of the embedded Ethereum transaction from a Kakarot invoke.
//!
//! A Kakarot EOA submits a Starknet `INVOKE` whose `__execute__` arguments carry the RLP (or
//! EIP-2718) payload of an Ethereum transaction, one byte per felt, behind six felts of call
//! framing. The Ethereum signature travels in the Starknet signature field, split into 128-bit
//! halves.

use crate::errors::DropReason;
use alloy_primitives::U256;
use kakarot_primitives::{
    Felt,
    felt::{felt_to_packed_bytes, felt_to_u64, u256_from_halves},
};
use thiserror::Error;

/// Number of leading calldata felts that frame the single call:
/// `[call_array_len, to, selector, data_offset, data_len, calldata_len]`.
pub const CALL_FRAME_LEN: usize = 6;

/// Number of felts in a Kakarot signature: `[r_low, r_high, s_low, s_high, v]`.
pub const SIGNATURE_LEN: usize = 5;

/// Errors raised while decoding the calldata or signature of a Kakarot invoke.
///
/// None of these are fatal to the block: the offending transaction is dropped and the
/// remaining transactions are processed normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalldataError {
    /// The transaction carries no invoke calldata.
    #[error("transaction has no calldata")]
    MissingCalldata,
    /// The call array bundles a number of calls other than one.
    #[error("unsupported call array length {0}, expected 1")]
    UnsupportedMultiCall(Felt),
    /// The signature does not have exactly five elements.
    #[error("invalid signature length {0}, expected {SIGNATURE_LEN}")]
    InvalidSignatureLength(usize),
    /// A signature half exceeds 128 bits, or `v` exceeds 64 bits.
    #[error("signature component {0} out of range")]
    InvalidSignatureComponent(&'static str),
}

impl CalldataError {
    /// Returns the drop reason reported for this error.
    pub const fn reason(&self) -> DropReason {
        match self {
            Self::MissingCalldata => DropReason::MissingCalldata,
            Self::UnsupportedMultiCall(_) => DropReason::UnsupportedMultiCall,
            Self::InvalidSignatureLength(_) => DropReason::InvalidSignatureLength,
            Self::InvalidSignatureComponent(_) => DropReason::InvalidSignatureComponent,
        }
    }
}

/// The Ethereum signature of a Kakarot transaction, reassembled from its felt halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature {
    /// `r_high << 128 | r_low`.
    pub r: U256,
    /// `s_high << 128 | s_low`.
    pub s: U256,
    /// The raw `v` value: an EIP-155 value for legacy transactions, a y-parity otherwise.
    pub v: u64,
}

impl RawSignature {
    /// Reassembles a signature from the five Starknet signature felts.
    pub fn from_felts(signature: &[Felt]) -> Result<Self, CalldataError> {
        let [r_low, r_high, s_low, s_high, v] = signature else {
            return Err(CalldataError::InvalidSignatureLength(signature.len()));
        };
        let r = u256_from_halves(r_low, r_high)
            .ok_or(CalldataError::InvalidSignatureComponent("r"))?;
        let s = u256_from_halves(s_low, s_high)
            .ok_or(CalldataError::InvalidSignatureComponent("s"))?;
        let v = felt_to_u64(v).ok_or(CalldataError::InvalidSignatureComponent("v"))?;
        Ok(Self { r, s, v })
    }
}

/// The Ethereum transaction embedded in a Kakarot invoke, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedTransaction {
    /// The unsigned transaction payload.
    pub payload: Vec<u8>,
    /// The detached signature.
    pub signature: RawSignature,
}

/// Decodes the embedded transaction payload and signature of a Kakarot invoke.
///
/// `calldata` is `None` for transactions without an invoke body.
pub fn decode_calldata(
    calldata: Option<&[Felt]>,
    signature: &[Felt],
) -> Result<EmbeddedTransaction, CalldataError> {
    let calldata = calldata.ok_or(CalldataError::MissingCalldata)?;
    let call_array_len = calldata.first().ok_or(CalldataError::MissingCalldata)?;
    if *call_array_len != Felt::ONE {
        return Err(CalldataError::UnsupportedMultiCall(*call_array_len));
    }

    let payload = calldata.iter().skip(CALL_FRAME_LEN).flat_map(felt_to_packed_bytes).collect();
    let signature = RawSignature::from_felts(signature)?;

    Ok(EmbeddedTransaction { payload, signature })
}

/// Packs an Ethereum payload into Kakarot invoke calldata, one byte per felt.
///
/// The framing felts target `to` with `selector`; offsets describe a single call.
pub fn encode_calldata(to: Felt, selector: Felt, payload: &[u8]) -> Vec<Felt> {
    let len = Felt::from(payload.len() as u64);
    let mut calldata = Vec::with_capacity(CALL_FRAME_LEN + payload.len());
    calldata.extend([Felt::ONE, to, selector, Felt::ZERO, len, len]);
    calldata.extend(payload.iter().map(|byte| Felt::from(*byte)));
    calldata
}

/// Splits a signature into the five Kakarot signature felts.
pub fn encode_signature(r: U256, s: U256, v: u64) -> Vec<Felt> {
    let split = |value: U256| {
        let low = value & U256::from(u128::MAX);
        let high: U256 = value >> 128usize;
        [Felt::from(low.to::<u128>()), Felt::from(high.to::<u128>())]
    };
    let [r_low, r_high] = split(r);
    let [s_low, s_high] = split(s);
    vec![r_low, r_high, s_low, s_high, Felt::from(v)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn frame(call_array_len: u64) -> Vec<Felt> {
        let mut calldata = vec![Felt::from(call_array_len)];
        calldata.extend([Felt::from(0x7a5u64), Felt::from(0x1u64), Felt::ZERO, Felt::ZERO, Felt::ZERO]);
        calldata
    }

    fn signature() -> Vec<Felt> {
        encode_signature(U256::from(1u8), U256::from(2u8), 1)
    }

    #[test]
    fn test_decode_payload_bytes() {
        let mut calldata = frame(1);
        calldata.extend([Felt::from(0xc0u64), Felt::ZERO, Felt::from(0x1234u64)]);

        let decoded = decode_calldata(Some(&calldata), &signature()).unwrap();
        assert_eq!(decoded.payload, vec![0xc0, 0x00, 0x12, 0x34]);
        assert_eq!(decoded.signature, RawSignature { r: U256::from(1u8), s: U256::from(2u8), v: 1 });
    }

    #[rstest]
    #[case::none(0)]
    #[case::two(2)]
    #[case::many(17)]
    fn test_decode_rejects_multi_call(#[case] call_array_len: u64) {
        let calldata = frame(call_array_len);
        let err = decode_calldata(Some(&calldata), &signature()).unwrap_err();
        assert_eq!(err, CalldataError::UnsupportedMultiCall(Felt::from(call_array_len)));
        assert_eq!(err.reason(), DropReason::UnsupportedMultiCall);
    }

    #[test]
    fn test_decode_missing_calldata() {
        assert_eq!(decode_calldata(None, &signature()), Err(CalldataError::MissingCalldata));
        assert_eq!(decode_calldata(Some(&[]), &signature()), Err(CalldataError::MissingCalldata));
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(6)]
    fn test_decode_rejects_signature_length(#[case] len: usize) {
        let calldata = frame(1);
        let err = decode_calldata(Some(&calldata), &vec![Felt::ONE; len]).unwrap_err();
        assert_eq!(err, CalldataError::InvalidSignatureLength(len));
    }

    #[test]
    fn test_signature_halves_joined_low_first() {
        let felts = [
            Felt::from(0x11u64),
            Felt::from(0x22u64),
            Felt::from(0x33u64),
            Felt::from(0x44u64),
            Felt::from(37u64),
        ];
        let signature = RawSignature::from_felts(&felts).unwrap();
        assert_eq!(signature.r, (U256::from(0x22u8) << 128usize) | U256::from(0x11u8));
        assert_eq!(signature.s, (U256::from(0x44u8) << 128usize) | U256::from(0x33u8));
        assert_eq!(signature.v, 37);
    }

    #[test]
    fn test_signature_component_overflow() {
        let wide = Felt::from_hex("0x100000000000000000000000000000000").unwrap();
        let felts = [wide, Felt::ZERO, Felt::ZERO, Felt::ZERO, Felt::ONE];
        assert_eq!(
            RawSignature::from_felts(&felts),
            Err(CalldataError::InvalidSignatureComponent("r"))
        );
    }

    #[test]
    fn test_encode_round_trip() {
        let r = U256::from_be_slice(&[0xab; 32]);
        let s = U256::from_be_slice(&[0x01; 32]);
        let calldata = encode_calldata(Felt::from(0x7a5u64), Felt::ONE, &[0x02, 0xc0]);
        let decoded = decode_calldata(Some(&calldata), &encode_signature(r, s, 0)).unwrap();
        assert_eq!(decoded.payload, vec![0x02, 0xc0]);
        assert_eq!(decoded.signature, RawSignature { r, s, v: 0 });
    }
}
