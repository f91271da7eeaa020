//! The per-block translation pipeline.

use crate::{
    HeaderFieldProvider, HeaderFields, PipelineResult, StoreItem,
    accumulator::{BlockAccumulator, FoldedTransaction},
    calldata::decode_calldata,
    codec::TypedTransaction,
    errors::{DropReason, TransactionError},
    header::assemble_header,
    log::{LogError, LogPosition, translate_event},
    receipt::{ReceiptContext, receipt_envelope},
};
use alloy_consensus::{TxEnvelope, transaction::Recovered};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{B256, logs_bloom};
use alloy_rpc_types_eth::Transaction;
use kakarot_primitives::{
    EventWithTransaction, ExecutionStatus, Felt, SourceBlock, SourceHeader, felt::felt_to_b256,
};
use std::collections::HashSet;

/// A transaction or log that produced no output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedRecord {
    /// Hash of the source transaction.
    pub source_transaction: Felt,
    /// In-block index of the source event, for dropped logs. `None` for dropped transactions.
    pub event_index: Option<u64>,
    /// Why no record was produced.
    pub reason: DropReason,
}

/// The translation of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutput {
    /// Number of the translated block.
    pub block_number: u64,
    /// Records for the sink, in emission order: for each transaction the transaction, its logs
    /// and its receipt, then the header last.
    pub items: Vec<StoreItem>,
    /// Transactions and logs that were dropped.
    pub drops: Vec<DroppedRecord>,
}

/// Translates Starknet blocks into Ethereum records.
#[derive(Debug, Clone)]
pub struct BlockPipeline<P> {
    provider: P,
}

impl<P: HeaderFieldProvider> BlockPipeline<P> {
    /// Creates a pipeline reading header fields from `provider`.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the header field provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Translates a block.
    ///
    /// The header fields are fetched once, before any transaction is folded. If they cannot be
    /// fetched the block fails as a whole and nothing is emitted for it.
    pub async fn process_block(&self, block: &SourceBlock) -> PipelineResult<BlockOutput> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let fields = self.provider.header_fields(&block.header).await.inspect_err(|err| {
            warn!(
                target: "translator::pipeline",
                block_number = block.header.block_number,
                %err,
                "Failed to fetch header fields"
            );
            #[cfg(feature = "metrics")]
            metrics::counter!(crate::Metrics::HEADER_FIELDS_ERRORS).increment(1);
        })?;

        #[cfg(feature = "metrics")]
        metrics::histogram!(crate::Metrics::HEADER_FIELDS_DURATION)
            .record(start.elapsed().as_secs_f64());

        Ok(translate_block(block, &fields))
    }
}

/// Translates a block whose header fields are already known.
///
/// This is a pure function of its inputs: the same block and fields always yield the same
/// records, trie roots included.
pub fn translate_block(block: &SourceBlock, fields: &HeaderFields) -> BlockOutput {
    let mut translator = BlockTranslator::new(&block.header, fields);
    for entry in &block.events {
        translator.push(entry);
    }
    translator.finish()
}

/// A transaction ready to be emitted and folded.
#[derive(Debug)]
struct TranslatedTransaction {
    items: Vec<StoreItem>,
    folded: FoldedTransaction,
    log_drops: Vec<(u64, LogError)>,
}

/// The ordered fold over the events of one block.
#[derive(Debug)]
struct BlockTranslator<'a> {
    header: &'a SourceHeader,
    fields: &'a HeaderFields,
    block_hash: B256,
    accumulator: BlockAccumulator,
    seen: HashSet<Felt>,
    items: Vec<StoreItem>,
    drops: Vec<DroppedRecord>,
}

impl<'a> BlockTranslator<'a> {
    fn new(header: &'a SourceHeader, fields: &'a HeaderFields) -> Self {
        Self {
            header,
            fields,
            block_hash: felt_to_b256(&header.block_hash),
            accumulator: BlockAccumulator::new(),
            seen: HashSet::new(),
            items: Vec::new(),
            drops: Vec::new(),
        }
    }

    /// Translates and folds the transaction behind one stream entry.
    fn push(&mut self, entry: &EventWithTransaction) {
        let source_transaction = *entry.transaction.hash();
        match self.translate(entry) {
            Ok(translated) => {
                for (event_index, err) in translated.log_drops {
                    self.drop_record(source_transaction, Some(event_index), err.reason(), &err);
                }
                let index = self.accumulator.fold(translated.folded);
                debug!(
                    target: "translator::pipeline",
                    block_number = self.header.block_number,
                    source_transaction = %format_args!("{source_transaction:#x}"),
                    index,
                    "Translated transaction"
                );
                self.items.extend(translated.items);
            }
            Err(err) => self.drop_record(source_transaction, None, err.reason(), &err),
        }
    }

    fn translate(
        &mut self,
        entry: &EventWithTransaction,
    ) -> Result<TranslatedTransaction, TransactionError> {
        let source_transaction = *entry.transaction.hash();
        if !self.seen.insert(source_transaction) {
            return Err(TransactionError::Duplicate(source_transaction));
        }

        let embedded =
            decode_calldata(entry.transaction.calldata(), entry.transaction.signature())?;
        let (tx, from) =
            TypedTransaction::decode_signed(&embedded.payload, embedded.signature)?.into_parts();
        let gas = self.accumulator.charge(entry.receipt.gas_used)?;

        let transaction_hash = tx.hash();
        let transaction_index = self.accumulator.next_transaction_index();
        let position = LogPosition {
            block_hash: self.block_hash,
            block_number: self.header.block_number,
            block_timestamp: self.header.timestamp,
            transaction_hash,
            transaction_index,
        };

        let mut logs = Vec::new();
        let mut rpc_logs = Vec::new();
        let mut log_drops = Vec::new();
        let mut log_index = self.accumulator.next_log_index();
        for event in &entry.receipt.events {
            match translate_event(&event.keys, &event.data) {
                Ok(log) => {
                    rpc_logs.push(position.rpc_log(log.clone(), log_index));
                    logs.push(log);
                    log_index += 1;
                }
                Err(err) => log_drops.push((event.index, err)),
            }
        }

        let tx_type = tx.tx_type();
        let status = entry.receipt.execution_status == ExecutionStatus::Succeeded;
        let bloom = logs_bloom(&logs);
        let log_count = logs.len() as u64;
        let encoded_receipt =
            receipt_envelope(tx_type, status, gas.cumulative_gas_used, logs, bloom).encoded_2718();

        let effective_gas_price = tx.effective_gas_price(self.fields.base_fee_per_gas);
        let context = ReceiptContext {
            transaction_hash,
            transaction_index,
            block_hash: self.block_hash,
            block_number: self.header.block_number,
            gas_used: gas.gas_used,
            effective_gas_price,
            from,
            to: tx.kind().to().copied(),
            contract_address: tx.contract_address(from),
        };
        let receipt = context.rpc_receipt(receipt_envelope(
            tx_type,
            status,
            gas.cumulative_gas_used,
            rpc_logs.clone(),
            bloom,
        ));

        let encoded_transaction = tx.encoded_2718();
        let transaction = Transaction {
            inner: Recovered::new_unchecked(TxEnvelope::from(tx), from),
            block_hash: Some(self.block_hash),
            block_number: Some(self.header.block_number),
            transaction_index: Some(transaction_index),
            effective_gas_price: Some(effective_gas_price),
        };

        let mut items = Vec::with_capacity(rpc_logs.len() + 2);
        items.push(StoreItem::Transactions { tx: Box::new(transaction) });
        items.extend(rpc_logs.into_iter().map(|log| StoreItem::Logs { log }));
        items.push(StoreItem::Receipts { receipt: Box::new(receipt) });

        Ok(TranslatedTransaction {
            items,
            folded: FoldedTransaction {
                encoded_transaction,
                encoded_receipt,
                logs_bloom: bloom,
                gas,
                log_count,
            },
            log_drops,
        })
    }

    fn drop_record(
        &mut self,
        source_transaction: Felt,
        event_index: Option<u64>,
        reason: DropReason,
        err: &dyn core::error::Error,
    ) {
        let code: &'static str = reason.into();
        if reason.is_filtered() {
            trace!(
                target: "translator::pipeline",
                block_number = self.header.block_number,
                source_transaction = %format_args!("{source_transaction:#x}"),
                ?event_index,
                reason = code,
                "Filtered record"
            );
        } else {
            warn!(
                target: "translator::pipeline",
                block_number = self.header.block_number,
                source_transaction = %format_args!("{source_transaction:#x}"),
                ?event_index,
                reason = code,
                %err,
                "Dropped record"
            );
        }

        #[cfg(feature = "metrics")]
        metrics::counter!(crate::Metrics::RECORDS_DROPPED, "reason" => code).increment(1);

        self.drops.push(DroppedRecord { source_transaction, event_index, reason });
    }

    fn finish(mut self) -> BlockOutput {
        let seal = self.accumulator.seal();
        let header = assemble_header(self.header, &seal, self.fields);
        self.items.push(StoreItem::Headers { header: Box::new(header) });

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(crate::Metrics::BLOCKS_TRANSLATED).increment(1);
            for item in &self.items {
                metrics::counter!(crate::Metrics::RECORDS_EMITTED, "collection" => item.collection())
                    .increment(1);
            }
        }

        info!(
            target: "translator::pipeline",
            block_number = self.header.block_number,
            transactions = seal.transaction_count,
            gas_used = seal.gas_used,
            drops = self.drops.len(),
            "Translated block"
        );

        BlockOutput { block_number: self.header.block_number, items: self.items, drops: self.drops }
    }
}
