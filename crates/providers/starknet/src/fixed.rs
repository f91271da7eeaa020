//! A provider with fixed header fields.

use async_trait::async_trait;
use kakarot_primitives::{SourceHeader, felt::felt_to_address_truncated};
use kakarot_translator::{HeaderFieldError, HeaderFieldProvider, HeaderFields};

/// The default block gas limit.
pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;

/// The default base fee per gas, 100 gwei.
pub const DEFAULT_BASE_FEE: u64 = 100_000_000_000;

/// Returns a fixed gas limit and base fee. The coinbase is the block's sequencer address,
/// truncated to 20 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticFieldProvider {
    gas_limit: u64,
    base_fee_per_gas: u64,
}

impl Default for StaticFieldProvider {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_LIMIT, DEFAULT_BASE_FEE)
    }
}

impl StaticFieldProvider {
    /// Creates a provider returning `gas_limit` and `base_fee_per_gas` for every block.
    pub const fn new(gas_limit: u64, base_fee_per_gas: u64) -> Self {
        Self { gas_limit, base_fee_per_gas }
    }
}

#[async_trait]
impl HeaderFieldProvider for StaticFieldProvider {
    async fn header_fields(&self, header: &SourceHeader) -> Result<HeaderFields, HeaderFieldError> {
        Ok(HeaderFields {
            coinbase: felt_to_address_truncated(&header.sequencer_address),
            base_fee_per_gas: self.base_fee_per_gas,
            gas_limit: self.gas_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use kakarot_primitives::Felt;

    fn header() -> SourceHeader {
        SourceHeader {
            block_hash: Felt::from(2u64),
            parent_block_hash: Felt::ONE,
            block_number: 2,
            sequencer_address: Felt::from_hex_unchecked(
                "0x01176a1bd84444c89232ec27754698e5d2e7e1a7f1539f12027f28b23ec9f3d8",
            ),
            new_root: Felt::ZERO,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_defaults() {
        let fields = StaticFieldProvider::default().header_fields(&header()).await.unwrap();
        assert_eq!(fields.gas_limit, 30_000_000);
        assert_eq!(fields.base_fee_per_gas, 100_000_000_000);
        assert_eq!(fields.coinbase, address!("0x754698e5d2e7e1a7f1539f12027f28b23ec9f3d8"));
    }

    #[tokio::test]
    async fn test_configured_values() {
        let fields = StaticFieldProvider::new(15_000_000, 7).header_fields(&header()).await.unwrap();
        assert_eq!(fields.gas_limit, 15_000_000);
        assert_eq!(fields.base_fee_per_gas, 7);
    }
}
