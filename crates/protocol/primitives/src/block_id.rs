use crate::hex::pad_hex;
use core::fmt;
use serde::{Deserialize, Serialize};
use starknet_types_core::felt::Felt;

/// Identifies a Starknet block in remote calls, either by hash or by number.
///
/// Serializes to the Starknet JSON-RPC shape: `{"block_hash": "0x.."}` or
/// `{"block_number": 12}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockId {
    /// Block hash.
    #[serde(rename = "block_hash")]
    Hash(Felt),
    /// Block height.
    #[serde(rename = "block_number")]
    Number(u64),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => f.write_str(&pad_hex(&format!("{hash:x}"), 32)),
            Self::Number(number) => write!(f, "#{number}"),
        }
    }
}

impl From<u64> for BlockId {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<Felt> for BlockId {
    fn from(hash: Felt) -> Self {
        Self::Hash(hash)
    }
}
