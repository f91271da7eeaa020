//! Test utilities for building signed Kakarot transactions and source blocks.

use crate::{
    HeaderFieldError, HeaderFieldProvider, HeaderFields,
    calldata::{EmbeddedTransaction, RawSignature, encode_calldata, encode_signature},
    codec::{EIP155_V_OFFSET, TypedTransaction, UnsignedTransaction},
};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxLegacy};
use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{Address, B256, Bytes, TxKind, U256, address};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use kakarot_primitives::{
    EventWithTransaction, ExecutionStatus, Felt, InvokeTransactionV1, SourceBlock, SourceEvent,
    SourceHeader, SourceReceipt, SourceTransaction, TransactionMeta, selector_from_name,
};

/// The Kakarot chain id (`KKRT`).
pub const KAKAROT_CHAIN_ID: u64 = 1_263_227_476;

/// Recipient of the fixture transactions.
pub const RECIPIENT: Address = address!("0x3535353535353535353535353535353535353535");

/// Address of the Kakarot contract used as the call target in fixture calldata.
pub const KAKAROT_ADDRESS: u64 = 0x7a5;

/// A legacy transfer, optionally carrying an EIP-155 chain id.
pub fn legacy_tx(chain_id: Option<u64>) -> TxLegacy {
    TxLegacy {
        chain_id,
        nonce: 0,
        gas_price: 1_000_000_000,
        gas_limit: 21_000,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(1u8),
        input: Bytes::new(),
    }
}

/// An EIP-2930 call with a one-entry access list.
pub fn eip2930_tx() -> TxEip2930 {
    TxEip2930 {
        chain_id: KAKAROT_CHAIN_ID,
        nonce: 0,
        gas_price: 1_000_000_000,
        gas_limit: 50_000,
        to: TxKind::Call(RECIPIENT),
        value: U256::ZERO,
        input: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        access_list: AccessList(vec![AccessListItem {
            address: RECIPIENT,
            storage_keys: vec![B256::ZERO],
        }]),
    }
}

/// An EIP-1559 transfer paying at most 200 gwei with a 2 gwei tip.
pub fn eip1559_tx() -> TxEip1559 {
    TxEip1559 {
        chain_id: KAKAROT_CHAIN_ID,
        nonce: 0,
        gas_limit: 21_000,
        max_fee_per_gas: 200_000_000_000,
        max_priority_fee_per_gas: 2_000_000_000,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(1u8),
        input: Bytes::new(),
        access_list: AccessList::default(),
    }
}

/// Returns the unsigned payload a Kakarot EOA embeds in its calldata.
pub fn unsigned_payload(tx: &UnsignedTransaction) -> Vec<u8> {
    let mut out = Vec::new();
    match tx {
        UnsignedTransaction::Legacy(tx) => tx.encode_for_signing(&mut out),
        UnsignedTransaction::AccessList(tx) => tx.encode_for_signing(&mut out),
        UnsignedTransaction::FeeMarket(tx) => tx.encode_for_signing(&mut out),
    }
    out
}

/// Signs transactions with a fixed key and packs them the way a Kakarot EOA does.
#[derive(Debug, Clone)]
pub struct TestSigner {
    signer: PrivateKeySigner,
}

impl Default for TestSigner {
    fn default() -> Self {
        Self::from_key(B256::repeat_byte(0x46))
    }
}

impl TestSigner {
    /// Creates a signer for the given private key.
    pub fn from_key(key: B256) -> Self {
        Self { signer: PrivateKeySigner::from_bytes(&key).expect("valid private key") }
    }

    /// Returns the signer's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs `tx` and returns its unsigned payload with the detached signature.
    ///
    /// Legacy transactions are signed under their own chain id (0 if absent) with an EIP-155
    /// `v`. Typed transactions carry a bare y-parity.
    pub fn embed(&self, tx: UnsignedTransaction) -> EmbeddedTransaction {
        let payload = unsigned_payload(&tx);
        let (hash, legacy_chain_id) = match &tx {
            UnsignedTransaction::Legacy(tx) => {
                let chain_id = tx.chain_id.unwrap_or_default();
                let mut tx = tx.clone();
                tx.chain_id = Some(chain_id);
                (tx.signature_hash(), Some(chain_id))
            }
            UnsignedTransaction::AccessList(tx) => (tx.signature_hash(), None),
            UnsignedTransaction::FeeMarket(tx) => (tx.signature_hash(), None),
        };
        let signature = self.signer.sign_hash_sync(&hash).expect("signing succeeds");
        let parity = u64::from(signature.v());
        let v = match legacy_chain_id {
            Some(chain_id) => EIP155_V_OFFSET + 2 * chain_id + parity,
            None => parity,
        };
        EmbeddedTransaction {
            payload,
            signature: RawSignature { r: signature.r(), s: signature.s(), v },
        }
    }

    /// Signs `tx`.
    pub fn sign(&self, tx: UnsignedTransaction) -> TypedTransaction {
        let embedded = self.embed(tx.clone());
        tx.into_signed(embedded.signature).expect("valid signature")
    }

    /// Wraps `tx` into a Starknet invoke as a Kakarot EOA would submit it.
    pub fn source_transaction(&self, tx: UnsignedTransaction, hash: Felt) -> SourceTransaction {
        let embedded = self.embed(tx);
        let RawSignature { r, s, v } = embedded.signature;
        SourceTransaction {
            meta: TransactionMeta { hash, signature: encode_signature(r, s, v) },
            invoke_v1: Some(InvokeTransactionV1 {
                sender_address: Felt::from_bytes_be_slice(self.address().as_slice()),
                calldata: encode_calldata(
                    Felt::from(KAKAROT_ADDRESS),
                    selector_from_name("eth_send_transaction"),
                    &embedded.payload,
                ),
            }),
        }
    }
}

/// Builds a Kakarot log event: `[address, lo0, hi0, ..]` keys with one byte per data felt.
pub fn evm_log_event(index: u64, address: Address, topics: &[B256], data: &[u8]) -> SourceEvent {
    let mut keys = vec![Felt::from_bytes_be_slice(address.as_slice())];
    for topic in topics {
        let value = U256::from_be_bytes(topic.0);
        let low = value & U256::from(u128::MAX);
        let high: U256 = value >> 128usize;
        keys.push(Felt::from(low.to::<u128>()));
        keys.push(Felt::from(high.to::<u128>()));
    }
    SourceEvent {
        index,
        from_address: Some(Felt::from(KAKAROT_ADDRESS)),
        keys,
        data: data.iter().map(|byte| Felt::from(*byte)).collect(),
    }
}

/// Builds the `transaction_executed` event Kakarot emits for every EOA transaction.
pub fn transaction_executed_event(index: u64) -> SourceEvent {
    SourceEvent {
        index,
        from_address: Some(Felt::from(KAKAROT_ADDRESS)),
        keys: vec![selector_from_name("transaction_executed")],
        data: vec![Felt::ONE],
    }
}

/// Builds a stream entry for `transaction`, with `events` as the receipt's events.
pub fn stream_entry(
    transaction: SourceTransaction,
    transaction_index: u64,
    gas_used: Option<u128>,
    events: Vec<SourceEvent>,
) -> EventWithTransaction {
    let event = events
        .iter()
        .find(|event| event.selector() == Some(&selector_from_name("transaction_executed")))
        .cloned()
        .unwrap_or_else(|| transaction_executed_event(0));
    EventWithTransaction {
        event,
        receipt: SourceReceipt {
            transaction_hash: *transaction.hash(),
            transaction_index,
            gas_used,
            execution_status: ExecutionStatus::Succeeded,
            events,
        },
        transaction,
    }
}

/// A fixed source header.
pub fn source_header(block_number: u64) -> SourceHeader {
    SourceHeader {
        block_hash: Felt::from(0xb10c_0000u64 + block_number),
        parent_block_hash: Felt::from(0xb10c_0000u64 + block_number.saturating_sub(1)),
        block_number,
        sequencer_address: Felt::from_hex_unchecked(
            "0x01176a1bd84444c89232ec27754698e5d2e7e1a7f1539f12027f28b23ec9f3d8",
        ),
        new_root: Felt::from(0x5707u64),
        timestamp: 1_700_000_000 + block_number,
    }
}

/// Builds a source block.
pub fn source_block(block_number: u64, events: Vec<EventWithTransaction>) -> SourceBlock {
    SourceBlock { header: source_header(block_number), events }
}

/// A [`HeaderFieldProvider`] returning fixed values.
#[derive(Debug, Clone, Copy)]
pub struct FixedFields(pub HeaderFields);

impl Default for FixedFields {
    fn default() -> Self {
        Self(HeaderFields {
            coinbase: address!("0x00000000000000000000000000000000000000c0"),
            base_fee_per_gas: 100_000_000_000,
            gas_limit: 30_000_000,
        })
    }
}

#[async_trait]
impl HeaderFieldProvider for FixedFields {
    async fn header_fields(&self, _: &SourceHeader) -> Result<HeaderFields, HeaderFieldError> {
        Ok(self.0)
    }
}
