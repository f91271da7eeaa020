//! Index-keyed Merkle-Patricia tries for transactions and receipts.

use alloy_primitives::B256;
use alloy_trie::{EMPTY_ROOT_HASH, HashBuilder, Nibbles};
use std::collections::BTreeMap;

/// A trie whose `i`-th value is stored under the key `rlp(i)`.
///
/// Values are appended in order. The [`HashBuilder`] needs leaves in key order, and `rlp(i)`
/// does not sort like `i` (`rlp(0) = 0x80` sorts after `rlp(1..=127)`), so leaves are kept in a
/// map keyed by their nibble path and only fed to the builder when the root is requested.
#[derive(Debug, Default, Clone)]
pub struct OrderedTrie {
    leaves: BTreeMap<Nibbles, Vec<u8>>,
}

impl OrderedTrie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of values in the trie.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns `true` if the trie holds no value.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Appends `value` under the next index and returns that index.
    pub fn push(&mut self, value: Vec<u8>) -> u64 {
        let index = self.leaves.len() as u64;
        let key = Nibbles::unpack(alloy_rlp::encode(index));
        self.leaves.insert(key, value);
        index
    }

    /// Consumes the trie and returns its root hash.
    pub fn root(self) -> B256 {
        if self.is_empty() {
            return EMPTY_ROOT_HASH;
        }
        let mut hash_builder = HashBuilder::default();
        for (key, value) in self.leaves {
            hash_builder.add_leaf(key, &value);
        }
        hash_builder.root()
    }
}
