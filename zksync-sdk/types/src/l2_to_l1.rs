use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::{SolCall, SolEvent};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{BOOTLOADER_FORMAL_ADDRESS, L1_MESSENGER_ADDRESS},
    contracts::{IL1Messenger::L1MessageSent, IL1SharedBridge},
    rpc::L2Log,
};

/// L2->L1 log as reported in L2 transaction receipts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2ToL1Log {
    #[serde(default)]
    pub block_number: U64,
    #[serde(default)]
    pub l1_batch_number: Option<U64>,
    #[serde(default)]
    pub transaction_index: U64,
    #[serde(default)]
    pub shard_id: U64,
    #[serde(default)]
    pub is_service: bool,
    pub sender: Address,
    pub key: B256,
    pub value: B256,
    #[serde(default)]
    pub transaction_hash: B256,
    #[serde(default)]
    pub log_index: U64,
    #[serde(default)]
    pub tx_index_in_l1_batch: Option<U64>,
}

/// Merkle proof of an L2->L1 log against the root of its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2ToL1LogProof {
    pub proof: Vec<B256>,
    pub id: u32,
    pub root: B256,
}

/// Everything the L1 bridge needs to replay a withdrawal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeWithdrawalParams {
    pub l1_batch_number: u64,
    pub l2_message_index: u32,
    pub l2_tx_number_in_block: u16,
    pub message: Bytes,
    pub sender: Address,
    pub proof: Vec<B256>,
}

impl FinalizeWithdrawalParams {
    pub fn finalize_withdrawal_calldata(&self, chain_id: u64) -> Bytes {
        IL1SharedBridge::finalizeWithdrawalCall {
            _chainId: U256::from(chain_id),
            _l2BatchNumber: U256::from(self.l1_batch_number),
            _l2MessageIndex: U256::from(self.l2_message_index),
            _l2TxNumberInBatch: self.l2_tx_number_in_block,
            _message: self.message.clone(),
            _merkleProof: self.proof.clone(),
        }
        .abi_encode()
        .into()
    }

    pub fn is_withdrawal_finalized_calldata(&self, chain_id: u64) -> Bytes {
        IL1SharedBridge::isWithdrawalFinalizedCall {
            _chainId: U256::from(chain_id),
            _l2BatchNumber: U256::from(self.l1_batch_number),
            _l2MessageIndex: U256::from(self.l2_message_index),
        }
        .abi_encode()
        .into()
    }
}

/// Position and proof of the bootloader log a priority operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityOpConfirmation {
    pub l1_batch_number: u64,
    pub l2_message_index: u32,
    pub l2_tx_number_in_block: u16,
    pub proof: Vec<B256>,
}

/// A withdrawal located in an L2 receipt. The proof is only known once
/// fetched from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRecord {
    pub l2_transaction_hash: B256,
    pub l2_to_l1_log_index: usize,
    pub l1_batch_tx_index: u16,
    pub l1_batch_number: u64,
    pub message: Bytes,
    pub sender: Address,
    pub merkle_proof: Option<L2ToL1LogProof>,
}

impl WithdrawalRecord {
    pub fn with_proof(mut self, proof: L2ToL1LogProof) -> Self {
        self.merkle_proof = Some(proof);
        self
    }

    /// `None` until the proof has been attached.
    pub fn finalize_params(&self) -> Option<FinalizeWithdrawalParams> {
        let proof = self.merkle_proof.as_ref()?;
        Some(FinalizeWithdrawalParams {
            l1_batch_number: self.l1_batch_number,
            l2_message_index: proof.id,
            l2_tx_number_in_block: self.l1_batch_tx_index,
            message: self.message.clone(),
            sender: self.sender,
            proof: proof.proof.clone(),
        })
    }
}

/// The `index`-th `L1MessageSent` event emitted by the L1 messenger, decoded.
pub fn find_l1_message(logs: &[L2Log], index: usize) -> Option<L1MessageSent> {
    logs.iter()
        .filter(|log| {
            log.address == L1_MESSENGER_ADDRESS
                && log.topics.first() == Some(&L1MessageSent::SIGNATURE_HASH)
        })
        .nth(index)
        .and_then(|log| L1MessageSent::decode_log_data(&log.log_data()).ok())
}

/// Position (within the receipt) of the `index`-th L2->L1 log sent by the L1
/// messenger.
pub fn find_messenger_l2_to_l1_log(logs: &[L2ToL1Log], index: usize) -> Option<(usize, &L2ToL1Log)> {
    logs.iter()
        .enumerate()
        .filter(|(_, log)| log.sender == L1_MESSENGER_ADDRESS)
        .nth(index)
}

/// Position of the `index`-th bootloader L2->L1 log keyed by `tx_hash`. Every
/// priority operation emits one, with value 1 on success and 0 on failure.
pub fn find_priority_op_l2_to_l1_log(
    logs: &[L2ToL1Log],
    tx_hash: B256,
    index: usize,
) -> Option<(usize, &L2ToL1Log)> {
    logs.iter()
        .enumerate()
        .filter(|(_, log)| log.sender == BOOTLOADER_FORMAL_ADDRESS && log.key == tx_hash)
        .nth(index)
}
