//! Output records handed to the sink.

use alloy_rpc_types_eth::{Header, Log, Transaction, TransactionReceipt};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// A record for the sink, tagged with the collection it belongs to.
///
/// Serializes as `{"collection": "transactions", "data": {"tx": {..}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "collection", content = "data", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreItem {
    /// A JSON-RPC transaction.
    Transactions {
        /// The transaction.
        tx: Box<Transaction>,
    },
    /// A JSON-RPC log.
    Logs {
        /// The log.
        log: Log,
    },
    /// A JSON-RPC receipt.
    Receipts {
        /// The receipt.
        receipt: Box<TransactionReceipt>,
    },
    /// A JSON-RPC header.
    Headers {
        /// The header.
        header: Box<Header>,
    },
}

impl StoreItem {
    /// Returns the collection name of the record.
    pub fn collection(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, LogData};
    use serde_json::json;

    #[test]
    fn test_store_item_tagging() {
        let item = StoreItem::Logs {
            log: Log {
                inner: alloy_primitives::Log {
                    address: Address::repeat_byte(0x11),
                    data: LogData::new_unchecked(Vec::new(), vec![0x2a].into()),
                },
                log_index: Some(3),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["collection"], json!("logs"));
        assert_eq!(value["data"]["log"]["address"], json!("0x1111111111111111111111111111111111111111"));
        assert_eq!(value["data"]["log"]["data"], json!("0x2a"));
        assert_eq!(value["data"]["log"]["logIndex"], json!("0x3"));
        assert_eq!(value["data"]["log"]["removed"], json!(false));
        assert_eq!(item.collection(), "logs");

        let back: StoreItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }
}
