//! Header fields read from the Kakarot contract over Starknet JSON-RPC.

use crate::ProviderBuildError;
use alloy_primitives::{Address, U256};
use alloy_rpc_client::RpcClient;
use alloy_transport_http::Http;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use kakarot_primitives::{
    BlockId, Felt, SourceHeader,
    felt::{felt_to_address, felt_to_u256, u256_from_halves},
    selector_from_name,
};
use kakarot_translator::{HeaderField, HeaderFieldError, HeaderFieldProvider, HeaderFields};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use url::Url;

/// The request body of `starknet_call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    /// The called contract.
    pub contract_address: Felt,
    /// `sn_keccak` of the entry point name.
    pub entry_point_selector: Felt,
    /// The call arguments.
    pub calldata: Vec<Felt>,
}

/// Reads [`HeaderFields`] from the Kakarot contract.
///
/// Each field is read with a `starknet_call` pinned to the hash of the block being
/// translated. Request failures are retried with the configured backoff. Responses that
/// cannot be decoded are not.
#[derive(Debug, Clone)]
pub struct StarknetFieldProvider {
    client: RpcClient,
    kakarot_address: Felt,
    backoff: ExponentialBuilder,
}

impl StarknetFieldProvider {
    /// Creates a provider calling the Kakarot contract at `kakarot_address` through `client`.
    pub const fn new(client: RpcClient, kakarot_address: Felt, backoff: ExponentialBuilder) -> Self {
        Self { client, kakarot_address, backoff }
    }

    /// Creates a provider over HTTP. A set `auth_token` is sent as a bearer token with every
    /// request.
    pub fn new_http(
        url: Url,
        auth_token: Option<&str>,
        kakarot_address: Felt,
        backoff: ExponentialBuilder,
    ) -> Result<Self, ProviderBuildError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let transport = Http::with_client(http, url);
        Ok(Self::new(RpcClient::new(transport, false), kakarot_address, backoff))
    }

    /// Calls the entry point of `field` at `block` and returns the raw result felts.
    pub async fn call(
        &self,
        field: HeaderField,
        block: BlockId,
    ) -> Result<Vec<Felt>, HeaderFieldError> {
        let request = FunctionCall {
            contract_address: self.kakarot_address,
            entry_point_selector: selector_from_name(field.entry_point()),
            calldata: Vec::new(),
        };

        let (client, request) = (&self.client, &request);
        let fetch = || async move {
            client
                .request::<_, Vec<Felt>>("starknet_call", (request.clone(), block))
                .await
                .map_err(|err| HeaderFieldError::Request { field, block, message: err.to_string() })
        };

        fetch
            .retry(self.backoff)
            .when(HeaderFieldError::is_transient)
            .notify(|err, duration| {
                debug!(
                    target: "providers::starknet",
                    %field,
                    %block,
                    %err,
                    "Retrying header field request after {duration:?}"
                );
            })
            .await
    }

    async fn coinbase(&self, block: BlockId) -> Result<Address, HeaderFieldError> {
        let field = HeaderField::Coinbase;
        let result = self.call(field, block).await?;
        let felt = single_felt(field, block, &result)?;
        felt_to_address(felt)
            .ok_or(HeaderFieldError::OutOfRange { field, value: felt_to_u256(felt) })
    }

    async fn quantity(&self, field: HeaderField, block: BlockId) -> Result<u64, HeaderFieldError> {
        let result = self.call(field, block).await?;
        let value = decode_quantity(field, block, &result)?;
        u64::try_from(value).map_err(|_| HeaderFieldError::OutOfRange { field, value })
    }
}

#[async_trait]
impl HeaderFieldProvider for StarknetFieldProvider {
    async fn header_fields(&self, header: &SourceHeader) -> Result<HeaderFields, HeaderFieldError> {
        let block = header.block_id();
        let fields = HeaderFields {
            coinbase: self.coinbase(block).await?,
            base_fee_per_gas: self.quantity(HeaderField::BaseFee, block).await?,
            gas_limit: self.quantity(HeaderField::GasLimit, block).await?,
        };
        trace!(
            target: "providers::starknet",
            %block,
            coinbase = %fields.coinbase,
            base_fee = fields.base_fee_per_gas,
            gas_limit = fields.gas_limit,
            "Fetched header fields"
        );
        Ok(fields)
    }
}

fn single_felt<'a>(
    field: HeaderField,
    block: BlockId,
    result: &'a [Felt],
) -> Result<&'a Felt, HeaderFieldError> {
    match result {
        [felt] => Ok(felt),
        _ => Err(HeaderFieldError::Malformed {
            field,
            block,
            message: format!("expected 1 felt, got {}", result.len()),
        }),
    }
}

/// Decodes a quantity returned either as a single felt or as a `(low, high)` u256.
fn decode_quantity(
    field: HeaderField,
    block: BlockId,
    result: &[Felt],
) -> Result<U256, HeaderFieldError> {
    match result {
        [value] => Ok(felt_to_u256(value)),
        [low, high] => u256_from_halves(low, high).ok_or_else(|| HeaderFieldError::Malformed {
            field,
            block,
            message: "u256 half exceeds 128 bits".into(),
        }),
        _ => Err(HeaderFieldError::Malformed {
            field,
            block,
            message: format!("expected 1 or 2 felts, got {}", result.len()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_transport::mock::{Asserter, MockTransport};
    use rstest::rstest;
    use std::time::Duration;

    const KAKAROT: Felt = Felt::from_hex_unchecked("0x7a5");

    fn provider(asserter: &Asserter, max_times: usize) -> StarknetFieldProvider {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
            .with_max_times(max_times);
        let client = RpcClient::new(MockTransport::new(asserter.clone()), false);
        StarknetFieldProvider::new(client, KAKAROT, backoff)
    }

    fn header() -> SourceHeader {
        SourceHeader {
            block_hash: Felt::from(0xb10cu64),
            parent_block_hash: Felt::from(0xb10bu64),
            block_number: 42,
            sequencer_address: Felt::from(0x5eu64),
            new_root: Felt::ZERO,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_function_call_shape() {
        let request = FunctionCall {
            contract_address: KAKAROT,
            entry_point_selector: selector_from_name("get_coinbase"),
            calldata: Vec::new(),
        };
        let params =
            serde_json::to_value((&request, BlockId::Hash(Felt::from(0xb10cu64)))).unwrap();
        assert_eq!(params[0]["contract_address"], "0x7a5");
        assert_eq!(params[0]["calldata"], serde_json::json!([]));
        assert_eq!(params[1]["block_hash"], "0xb10c");
    }

    #[rstest]
    #[case::single(&[Felt::from(100_000_000_000u64)], U256::from(100_000_000_000u64))]
    #[case::halves(&[Felt::from(30_000_000u64), Felt::ZERO], U256::from(30_000_000u64))]
    #[case::high_half(&[Felt::ZERO, Felt::ONE], U256::from(1u8) << 128usize)]
    fn test_decode_quantity(#[case] result: &[Felt], #[case] expected: U256) {
        let value = decode_quantity(HeaderField::BaseFee, BlockId::Number(1), result).unwrap();
        assert_eq!(value, expected);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::three(&[Felt::ONE, Felt::ONE, Felt::ONE])]
    #[case::wide_half(&[Felt::from_hex_unchecked("0x100000000000000000000000000000000"), Felt::ZERO])]
    fn test_decode_quantity_malformed(#[case] result: &[Felt]) {
        let err = decode_quantity(HeaderField::GasLimit, BlockId::Number(1), result).unwrap_err();
        assert!(matches!(err, HeaderFieldError::Malformed { field: HeaderField::GasLimit, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_header_fields() {
        let asserter = Asserter::new();
        asserter.push_success(&vec![Felt::from_hex_unchecked(
            "0x00000000000000000000000000000000000000000000000000000000000000c0",
        )]);
        asserter.push_success(&vec![Felt::from(100_000_000_000u64), Felt::ZERO]);
        asserter.push_success(&vec![Felt::from(30_000_000u64)]);

        let fields = provider(&asserter, 0).header_fields(&header()).await.unwrap();
        assert_eq!(
            fields,
            HeaderFields {
                coinbase: address!("0x00000000000000000000000000000000000000c0"),
                base_fee_per_gas: 100_000_000_000,
                gas_limit: 30_000_000,
            }
        );
    }

    #[tokio::test]
    async fn test_request_retried() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("rate limited");
        asserter.push_success(&vec![Felt::from(30_000_000u64)]);

        let result =
            provider(&asserter, 1).call(HeaderField::GasLimit, header().block_id()).await.unwrap();
        assert_eq!(result, vec![Felt::from(30_000_000u64)]);
    }

    #[tokio::test]
    async fn test_request_fails_after_retries() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("unavailable");
        asserter.push_failure_msg("unavailable");

        let err = provider(&asserter, 1).header_fields(&header()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(
            err,
            HeaderFieldError::Request { field: HeaderField::Coinbase, block: BlockId::Hash(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_coinbase_out_of_range() {
        let asserter = Asserter::new();
        asserter.push_success(&vec![Felt::from_hex_unchecked(
            "0x01176a1bd84444c89232ec27754698e5d2e7e1a7f1539f12027f28b23ec9f3d8",
        )]);

        let err = provider(&asserter, 0).header_fields(&header()).await.unwrap_err();
        assert!(matches!(err, HeaderFieldError::OutOfRange { field: HeaderField::Coinbase, .. }));
    }

    #[tokio::test]
    async fn test_gas_limit_out_of_range() {
        let asserter = Asserter::new();
        asserter.push_success(&vec![Felt::from(0xc0u64)]);
        asserter.push_success(&vec![Felt::ONE]);
        asserter.push_success(&vec![Felt::ZERO, Felt::ONE]);

        let err = provider(&asserter, 0).header_fields(&header()).await.unwrap_err();
        assert_eq!(
            err,
            HeaderFieldError::OutOfRange { field: HeaderField::GasLimit, value: U256::from(1u8) << 128usize }
        );
    }
}
