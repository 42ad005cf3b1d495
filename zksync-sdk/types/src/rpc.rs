//! Request and response shapes of the `zks_` and `eth_` methods the SDK calls.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, LogData, B256, U256, U64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{l2_to_l1::L2ToL1Log, paymaster::PaymasterParams};

/// Serializes bytes as a JSON array of numbers, the form the node expects
/// for factory dependencies and paymaster input.
pub mod byte_array {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(bytes.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        Vec::<u8>::deserialize(deserializer).map(Bytes::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeAddresses {
    pub l1_shared_default_bridge: Option<Address>,
    pub l2_shared_default_bridge: Option<Address>,
    pub l1_erc20_default_bridge: Option<Address>,
    pub l2_erc20_default_bridge: Option<Address>,
    pub l1_weth_bridge: Option<Address>,
    pub l2_weth_bridge: Option<Address>,
    pub l2_legacy_shared_bridge: Option<Address>,
}

/// Fee estimate returned by `zks_estimateFee`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub gas_limit: U256,
    pub gas_per_pubdata_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Network-specific fields of a transaction request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Meta {
    pub gas_per_pubdata: U256,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub factory_deps: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_signature: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_params: Option<PaymasterParams>,
}

/// Transaction request understood by `eth_call`, `eth_estimateGas`,
/// `zks_estimateFee` and `zks_estimateGasL1ToL2`, and the input of L2
/// transaction population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
    #[serde(default, rename = "gas", skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip712_meta: Option<Eip712Meta>,
}

impl CallRequest {
    /// Plain `eth_call` request.
    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            to: Some(to),
            data: Some(data),
            ..Default::default()
        }
    }
}

/// Event log in an L2 receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub l1_batch_number: Option<U64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub log_index: Option<U64>,
}

impl L2Log {
    pub fn log_data(&self) -> LogData {
        LogData::new_unchecked(self.topics.clone(), self.data.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub transaction_index: Option<U64>,
    #[serde(default)]
    pub l1_batch_number: Option<U64>,
    #[serde(default)]
    pub l1_batch_tx_index: Option<U64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<L2Log>,
    #[serde(default)]
    pub l2_to_l1_logs: Vec<L2ToL1Log>,
}

impl L2TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == Some(U64::from(1))
    }
}

/// Transaction as returned by `eth_getTransactionByHash` on L2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2RpcTransaction {
    pub hash: B256,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default)]
    pub nonce: U256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub transaction_index: Option<U64>,
    #[serde(default)]
    pub l1_batch_number: Option<U64>,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<U64>,
}

/// The fields of a block the SDK looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub number: U64,
    pub hash: B256,
    #[serde(default)]
    pub timestamp: U64,
    #[serde(default)]
    pub l1_batch_number: Option<U64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockStatus {
    Sealed,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDetails {
    pub number: u64,
    pub l1_batch_number: u64,
    pub timestamp: u64,
    pub l1_tx_count: u64,
    pub l2_tx_count: u64,
    pub status: BlockStatus,
    #[serde(default)]
    pub root_hash: Option<B256>,
    #[serde(default)]
    pub commit_tx_hash: Option<B256>,
    #[serde(default)]
    pub prove_tx_hash: Option<B256>,
    #[serde(default)]
    pub execute_tx_hash: Option<B256>,
    #[serde(default)]
    pub operator_address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1BatchDetails {
    pub number: u64,
    pub timestamp: u64,
    pub l1_tx_count: u64,
    pub l2_tx_count: u64,
    pub status: BlockStatus,
    #[serde(default)]
    pub root_hash: Option<B256>,
    #[serde(default)]
    pub commit_tx_hash: Option<B256>,
    #[serde(default)]
    pub prove_tx_hash: Option<B256>,
    #[serde(default)]
    pub execute_tx_hash: Option<B256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionDetailsStatus {
    Pending,
    Included,
    Verified,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub is_l1_originated: bool,
    pub status: TransactionDetailsStatus,
    pub fee: U256,
    #[serde(default)]
    pub gas_per_pubdata: Option<U256>,
    pub initiator_address: Address,
    #[serde(default)]
    pub eth_commit_tx_hash: Option<B256>,
    #[serde(default)]
    pub eth_prove_tx_hash: Option<B256>,
    #[serde(default)]
    pub eth_execute_tx_hash: Option<B256>,
}

/// Lifecycle of a transaction from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    NotFound,
    Processing,
    Committed,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub l1_address: Address,
    pub l2_address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLog {
    pub address: Address,
    pub key: U256,
    pub written_value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedOutput {
    pub transaction_hash: B256,
    #[serde(default)]
    pub storage_logs: Vec<StorageLog>,
    #[serde(default)]
    pub events: Vec<L2Log>,
}

/// `zks_getAllAccountBalances` result: token address to balance.
pub type AccountBalances = HashMap<Address, U256>;
