use alloy_eips::BlockNumberOrTag;
use alloy_primitives::B256;
use alloy_rpc_types_eth::TransactionReceipt;
use tracing::{debug, info, instrument};
use zksync_sdk_types::{
    find_priority_op_l2_to_l1_log, l2_hash_from_priority_op,
    rpc::{L2RpcTransaction, L2TransactionReceipt},
    CodecError, PriorityOpConfirmation, PriorityOpError,
};

use crate::{
    error::{SdkError, SdkResult},
    l1::{wait_for_l1_receipt, L1Client},
    provider::RollupProvider,
    transaction::PendingL2Transaction,
};

/// Tracks an L1 transaction that enqueued a priority operation through to
/// the L2 transaction it produced.
pub struct PriorityOpHandle<'a, L: ?Sized> {
    provider: &'a RollupProvider,
    l1: &'a L,
    l1_tx_hash: B256,
}

impl<'a, L: L1Client + ?Sized> PriorityOpHandle<'a, L> {
    pub fn new(provider: &'a RollupProvider, l1: &'a L, l1_tx_hash: B256) -> Self {
        Self {
            provider,
            l1,
            l1_tx_hash,
        }
    }

    pub fn l1_tx_hash(&self) -> B256 {
        self.l1_tx_hash
    }

    /// Waits for the L1 receipt.
    pub async fn wait_l1_commit(&self) -> SdkResult<TransactionReceipt> {
        wait_for_l1_receipt(self.l1, self.l1_tx_hash, self.provider.polling_interval()).await
    }

    /// L2 hash of the priority operation, read from the L1 receipt.
    pub async fn l2_tx_hash(&self) -> SdkResult<B256> {
        let receipt = self.wait_l1_commit().await?;
        let main_contract = self.provider.get_main_contract_address().await?;
        let l2_tx_hash = l2_hash_from_priority_op(receipt.inner.logs(), main_contract)?;
        info!(l1_tx_hash = %self.l1_tx_hash, %l2_tx_hash, "Resolved priority operation");
        Ok(l2_tx_hash)
    }

    /// Polls until the L2 node knows the priority operation's transaction.
    #[instrument(skip_all, fields(l1_tx_hash = %self.l1_tx_hash))]
    pub async fn wait_l2_transaction(&self) -> SdkResult<L2RpcTransaction> {
        let l2_tx_hash = self.l2_tx_hash().await?;
        loop {
            metrics::counter!("zksync_sdk_polling_iterations_total", "loop" => "priority_op").increment(1);

            if let Some(tx) = self.provider.get_transaction(l2_tx_hash).await? {
                return Ok(tx);
            }

            debug!(%l2_tx_hash, "Priority operation not observed on L2 yet");
            tokio::time::sleep(self.provider.polling_interval()).await;
        }
    }

    /// Waits for the L2 receipt of the priority operation.
    pub async fn wait(&self) -> SdkResult<L2TransactionReceipt> {
        let l2_tx_hash = self.l2_tx_hash().await?;
        PendingL2Transaction::new(self.provider, l2_tx_hash).wait(1).await
    }

    /// Waits until the block holding the priority operation is finalized.
    #[instrument(skip_all, fields(l1_tx_hash = %self.l1_tx_hash))]
    pub async fn wait_finalize(&self) -> SdkResult<L2TransactionReceipt> {
        let receipt = self.wait().await?;
        let block_number = receipt
            .block_number
            .ok_or(SdkError::TransactionNotMined(receipt.transaction_hash))?;

        loop {
            metrics::counter!("zksync_sdk_polling_iterations_total", "loop" => "finalize").increment(1);

            let finalized = self.provider.get_block_by_number(BlockNumberOrTag::Finalized).await?;
            if matches!(&finalized, Some(block) if block.number >= block_number) {
                info!(l2_tx_hash = %receipt.transaction_hash, "Priority operation finalized");
                return Ok(receipt);
            }

            debug!(?finalized, %block_number, "Block not finalized yet");
            tokio::time::sleep(self.provider.polling_interval()).await;
        }
    }
}

/// Batch number and index within the batch of a mined L2 transaction.
pub(crate) fn batch_position(receipt: &L2TransactionReceipt) -> SdkResult<(u64, u16)> {
    let not_mined = || SdkError::TransactionNotMined(receipt.transaction_hash);
    let l1_batch_number = receipt.l1_batch_number.ok_or_else(not_mined)?;
    let l1_batch_tx_index = receipt.l1_batch_tx_index.ok_or_else(not_mined)?;

    let l1_batch_tx_index = u16::try_from(l1_batch_tx_index).map_err(|_| CodecError::InvalidField {
        field_name: "l1BatchTxIndex",
        reason: "value out of range",
    })?;
    Ok((l1_batch_number.to::<u64>(), l1_batch_tx_index))
}

/// Position and proof of the bootloader log the priority operation `tx_hash`
/// emitted on L2.
pub async fn get_priority_op_confirmation(
    provider: &RollupProvider,
    tx_hash: B256,
    index: usize,
) -> SdkResult<PriorityOpConfirmation> {
    let receipt = provider
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or(SdkError::TransactionNotMined(tx_hash))?;
    let (log_index, _) = find_priority_op_l2_to_l1_log(&receipt.l2_to_l1_logs, tx_hash, index)
        .ok_or(PriorityOpError::MissingBootloaderLog(tx_hash))?;
    let (l1_batch_number, l2_tx_number_in_block) = batch_position(&receipt)?;

    let proof = provider
        .get_l2_to_l1_log_proof(tx_hash, Some(log_index))
        .await?
        .ok_or(SdkError::LogProofNotFound(tx_hash))?;

    Ok(PriorityOpConfirmation {
        l1_batch_number,
        l2_message_index: proof.id,
        l2_tx_number_in_block,
        proof: proof.proof,
    })
}
