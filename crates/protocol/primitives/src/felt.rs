//! Conversions from Starknet field elements into Ethereum primitives.
//!
//! Every conversion that narrows a felt is checked: a felt that does not fit the target
//! width yields `None` instead of being silently truncated.

use crate::hex::{pad_bytes, trim_leading_zeros};
use alloy_primitives::{Address, B256, U256, keccak256};
use starknet_types_core::felt::Felt;

/// Returns the felt as a 256-bit unsigned integer.
pub fn felt_to_u256(felt: &Felt) -> U256 {
    U256::from_be_bytes(felt.to_bytes_be())
}

/// Returns the felt as a 32-byte big-endian word.
pub fn felt_to_b256(felt: &Felt) -> B256 {
    B256::from(felt.to_bytes_be())
}

/// Returns the felt as a `u128`, or `None` if it is wider than 128 bits.
pub fn felt_to_u128(felt: &Felt) -> Option<u128> {
    u128::try_from(felt_to_u256(felt)).ok()
}

/// Returns the felt as a `u64`, or `None` if it is wider than 64 bits.
pub fn felt_to_u64(felt: &Felt) -> Option<u64> {
    u64::try_from(felt_to_u256(felt)).ok()
}

/// Returns the felt as a single byte, or `None` if it is 256 or more.
pub fn felt_to_u8(felt: &Felt) -> Option<u8> {
    u8::try_from(felt_to_u256(felt)).ok()
}

const ADDRESS_LEN: usize = 20;

/// Returns the felt as an Ethereum [`Address`], or `None` if it is wider than 160 bits.
pub fn felt_to_address(felt: &Felt) -> Option<Address> {
    let bytes = felt_to_packed_bytes(felt);
    if bytes.len() > ADDRESS_LEN {
        return None;
    }
    Some(Address::from_slice(&pad_bytes(&bytes, ADDRESS_LEN)))
}

/// Returns the low 160 bits of the felt as an [`Address`].
///
/// Used for Starknet contract addresses (e.g. the sequencer) that have no Ethereum
/// counterpart and only need a stable 20-byte rendering.
pub fn felt_to_address_truncated(felt: &Felt) -> Address {
    Address::from_slice(&felt.to_bytes_be()[12..])
}

/// Returns the minimal big-endian byte packing of the felt. Zero packs to a single `0x00`.
pub fn felt_to_packed_bytes(felt: &Felt) -> Vec<u8> {
    trim_leading_zeros(&felt.to_bytes_be()).to_vec()
}

/// Joins a `(low, high)` pair of 128-bit felts into one 256-bit value: `high << 128 | low`.
///
/// Returns `None` if either half is wider than 128 bits.
pub fn u256_from_halves(low: &Felt, high: &Felt) -> Option<U256> {
    let low = felt_to_u128(low)?;
    let high = felt_to_u128(high)?;
    Some((U256::from(high) << 128usize) | U256::from(low))
}

/// Starknet keccak: keccak256 of `data` truncated to its low 250 bits.
pub fn sn_keccak(data: &[u8]) -> Felt {
    let mut hash = keccak256(data).0;
    // Mask with 2**250 - 1 so the value always fits the field.
    hash[0] &= 0x03;
    Felt::from_bytes_be(&hash)
}

/// Computes the entry point / event selector for `name`.
pub fn selector_from_name(name: &str) -> Felt {
    match name {
        "__default__" | "__l1_default__" => Felt::ZERO,
        _ => sn_keccak(name.as_bytes()),
    }
}
