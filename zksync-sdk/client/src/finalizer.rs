use alloy_primitives::{Address, B256, U256};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use tracing::{info, instrument, warn};
use zksync_sdk_types::{
    contracts::{IL1SharedBridge, IL2SharedBridge},
    find_l1_message, find_messenger_l2_to_l1_log, find_priority_op_l2_to_l1_log, undo_l1_to_l2_alias,
    FinalizeWithdrawalParams, PriorityOpError, WithdrawalRecord, L2_BASE_TOKEN_ADDRESS,
};

use crate::{
    correlator::batch_position,
    error::{SdkError, SdkResult},
    l1::{ensure_settlement_chain, L1Client, L1PendingTransaction},
    provider::RollupProvider,
};

/// Finds the `index`-th withdrawal message sent by `tx_hash`.
pub async fn locate_withdrawal(provider: &RollupProvider, tx_hash: B256, index: usize) -> SdkResult<WithdrawalRecord> {
    let receipt = provider
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or(SdkError::TransactionNotMined(tx_hash))?;
    let log_not_found = || SdkError::WithdrawalLogNotFound { hash: tx_hash, index };

    let message = find_l1_message(&receipt.logs, index).ok_or_else(log_not_found)?;
    let (l2_to_l1_log_index, _) =
        find_messenger_l2_to_l1_log(&receipt.l2_to_l1_logs, index).ok_or_else(log_not_found)?;
    let (l1_batch_number, l1_batch_tx_index) = batch_position(&receipt)?;

    Ok(WithdrawalRecord {
        l2_transaction_hash: tx_hash,
        l2_to_l1_log_index,
        l1_batch_tx_index,
        l1_batch_number,
        message: message._message,
        sender: message._sender,
        merkle_proof: None,
    })
}

/// The withdrawal located in `tx_hash` together with its inclusion proof.
pub async fn get_withdrawal_record(provider: &RollupProvider, tx_hash: B256, index: usize) -> SdkResult<WithdrawalRecord> {
    let record = locate_withdrawal(provider, tx_hash, index).await?;
    let proof = provider
        .get_l2_to_l1_log_proof(tx_hash, Some(record.l2_to_l1_log_index))
        .await?
        .ok_or(SdkError::LogProofNotFound(tx_hash))?;
    Ok(record.with_proof(proof))
}

pub async fn get_finalize_withdrawal_params(
    provider: &RollupProvider,
    tx_hash: B256,
    index: usize,
) -> SdkResult<FinalizeWithdrawalParams> {
    get_withdrawal_record(provider, tx_hash, index)
        .await?
        .finalize_params()
        .ok_or(SdkError::LogProofNotFound(tx_hash))
}

/// L1 bridge that accepts messages from the L2 `sender`.
async fn l1_bridge_for(provider: &RollupProvider, sender: Address) -> SdkResult<Address> {
    if sender == L2_BASE_TOKEN_ADDRESS {
        return provider.l1_shared_bridge_address().await;
    }
    provider
        .call_contract(sender, IL2SharedBridge::l1SharedBridgeCall {})
        .await
}

/// `isWithdrawalFinalized` on the L1 bridge that accepts `params`.
async fn withdrawal_finalized_on<L: L1Client + ?Sized>(
    l1: &L,
    bridge: Address,
    params: &FinalizeWithdrawalParams,
    chain_id: u64,
) -> SdkResult<bool> {
    let output = l1
        .call(bridge, params.is_withdrawal_finalized_calldata(chain_id))
        .await?;
    IL1SharedBridge::isWithdrawalFinalizedCall::abi_decode_returns(&output)
        .map_err(SdkError::abi_decode(IL1SharedBridge::isWithdrawalFinalizedCall::SIGNATURE))
}

pub async fn is_withdrawal_finalized<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    tx_hash: B256,
    index: usize,
) -> SdkResult<bool> {
    let params = get_finalize_withdrawal_params(provider, tx_hash, index).await?;
    let bridge = l1_bridge_for(provider, params.sender).await?;
    let chain_id = provider.chain_id().await?;
    withdrawal_finalized_on(l1, bridge, &params, chain_id).await
}

/// Replays the withdrawal message on L1. Fails without sending when the
/// bridge already reports the withdrawal as finalized.
#[instrument(skip_all, fields(%tx_hash, index))]
pub async fn finalize_withdrawal<'a, L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &'a L,
    tx_hash: B256,
    index: usize,
) -> SdkResult<L1PendingTransaction<'a, L>> {
    ensure_settlement_chain(provider, l1).await?;
    let params = get_finalize_withdrawal_params(provider, tx_hash, index).await?;
    let bridge = l1_bridge_for(provider, params.sender).await?;
    let chain_id = provider.chain_id().await?;

    if withdrawal_finalized_on(l1, bridge, &params, chain_id).await? {
        warn!(%tx_hash, "Withdrawal already finalized");
        return Err(SdkError::WithdrawalAlreadyFinalized(tx_hash));
    }

    let tx = TransactionRequest::default()
        .from(l1.address())
        .to(bridge)
        .input(TransactionInput::new(params.finalize_withdrawal_calldata(chain_id)));
    let l1_tx_hash = l1.send_transaction(tx).await?;
    info!(%l1_tx_hash, %bridge, batch = params.l1_batch_number, "Sent withdrawal finalization");

    Ok(L1PendingTransaction::new(l1, l1_tx_hash, provider.polling_interval()))
}

/// Recovers the funds of a bridged deposit whose L2 execution failed.
#[instrument(skip_all, fields(%deposit_hash))]
pub async fn claim_failed_deposit<'a, L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &'a L,
    deposit_hash: B256,
) -> SdkResult<L1PendingTransaction<'a, L>> {
    ensure_settlement_chain(provider, l1).await?;
    let receipt = provider
        .get_transaction_receipt(deposit_hash)
        .await?
        .ok_or(SdkError::TransactionNotMined(deposit_hash))?;
    let (log_index, log) = find_priority_op_l2_to_l1_log(&receipt.l2_to_l1_logs, deposit_hash, 0)
        .ok_or(PriorityOpError::MissingBootloaderLog(deposit_hash))?;
    if log.value != B256::ZERO {
        return Err(SdkError::CannotClaimSuccessfulDeposit(deposit_hash));
    }

    let tx = provider
        .get_transaction(deposit_hash)
        .await?
        .ok_or(SdkError::TransactionNotMined(deposit_hash))?;
    let deposit = IL2SharedBridge::finalizeDepositCall::abi_decode(&tx.input)
        .map_err(SdkError::abi_decode(IL2SharedBridge::finalizeDepositCall::SIGNATURE))?;
    let l1_bridge = undo_l1_to_l2_alias(receipt.from);

    let (l1_batch_number, l1_batch_tx_index) = batch_position(&receipt)?;
    let proof = provider
        .get_l2_to_l1_log_proof(deposit_hash, Some(log_index))
        .await?
        .ok_or(SdkError::LogProofNotFound(deposit_hash))?;
    let chain_id = provider.chain_id().await?;

    let data = IL1SharedBridge::claimFailedDepositCall {
        _chainId: U256::from(chain_id),
        _depositSender: deposit._l1Sender,
        _l1Token: deposit._l1Token,
        _amount: deposit._amount,
        _l2TxHash: deposit_hash,
        _l2BatchNumber: U256::from(l1_batch_number),
        _l2MessageIndex: U256::from(proof.id),
        _l2TxNumberInBatch: l1_batch_tx_index,
        _merkleProof: proof.proof,
    }
    .abi_encode();

    let tx = TransactionRequest::default()
        .from(l1.address())
        .to(l1_bridge)
        .input(TransactionInput::new(data.into()));
    let l1_tx_hash = l1.send_transaction(tx).await?;
    info!(%l1_tx_hash, %l1_bridge, "Sent failed deposit claim");

    Ok(L1PendingTransaction::new(l1, l1_tx_hash, provider.polling_interval()))
}
