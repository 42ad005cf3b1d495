use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use zksync_sdk_types::{
    rpc::{AccountBalances, CallRequest, Fee},
    AllowanceRequirement, FinalizeWithdrawalParams, FullDepositFee, PriorityOpConfirmation,
};

use crate::{
    config::NetworkConfig,
    correlator::{get_priority_op_confirmation, PriorityOpHandle},
    deposit::{self, DepositRequest},
    error::SdkResult,
    finalizer,
    l1::{connect_l1_http, AlloyL1Client, L1Client, L1PendingTransaction},
    provider::RollupProvider,
    transaction::{
        populate_transaction, send_signed_transaction, sign_populated_transaction, PendingL2Transaction,
        PopulatedTransaction,
    },
    withdraw::{transfer_request, withdraw_request, TransferRequest, WithdrawRequest},
};

/// An account that signs and submits L2 transactions.
#[async_trait]
pub trait L2Capable: Send + Sync {
    fn l2_provider(&self) -> &RollupProvider;

    fn l2_signer(&self) -> &(dyn SignerSync + Send + Sync);

    fn address(&self) -> Address;

    async fn populate_transaction(&self, request: CallRequest) -> SdkResult<PopulatedTransaction> {
        populate_transaction(self.l2_provider(), self.address(), request).await
    }

    fn sign_transaction(&self, tx: PopulatedTransaction) -> SdkResult<Bytes> {
        sign_populated_transaction(tx, self.l2_signer())
    }

    async fn send_transaction<'a>(&'a self, request: CallRequest) -> SdkResult<PendingL2Transaction<'a>> {
        let tx = self.populate_transaction(request).await?;
        let tx_bytes = self.sign_transaction(tx)?;
        send_signed_transaction(self.l2_provider(), tx_bytes).await
    }

    async fn withdraw<'a>(&'a self, request: WithdrawRequest) -> SdkResult<PendingL2Transaction<'a>> {
        let call = withdraw_request(self.l2_provider(), Some(self.address()), request).await?;
        self.send_transaction(call).await
    }

    async fn transfer<'a>(&'a self, request: TransferRequest) -> SdkResult<PendingL2Transaction<'a>> {
        let call = transfer_request(self.l2_provider(), Some(self.address()), request).await?;
        self.send_transaction(call).await
    }

    async fn estimate_fee(&self, mut request: CallRequest) -> SdkResult<Fee> {
        request.from.get_or_insert(self.address());
        self.l2_provider().estimate_fee(request).await
    }

    /// Balance in the L2 token `token`, or in the base token.
    async fn get_balance(&self, token: Option<Address>) -> SdkResult<U256> {
        self.l2_provider().get_token_balance(self.address(), token).await
    }

    async fn get_all_balances(&self) -> SdkResult<AccountBalances> {
        self.l2_provider().get_all_account_balances(self.address()).await
    }

    async fn get_nonce(&self, block: BlockNumberOrTag) -> SdkResult<U256> {
        self.l2_provider().get_transaction_count(self.address(), block).await
    }

    async fn get_priority_op_confirmation(&self, tx_hash: B256, index: usize) -> SdkResult<PriorityOpConfirmation> {
        get_priority_op_confirmation(self.l2_provider(), tx_hash, index).await
    }
}

/// An account that also controls the matching L1 address.
#[async_trait]
pub trait L1Capable: L2Capable {
    type L1: L1Client + 'static;

    fn l1_client(&self) -> &Self::L1;

    async fn deposit<'a>(&'a self, request: DepositRequest) -> SdkResult<PriorityOpHandle<'a, Self::L1>> {
        deposit::deposit(self.l2_provider(), self.l1_client(), request).await
    }

    async fn estimate_gas_deposit(&self, request: DepositRequest) -> SdkResult<u64> {
        deposit::estimate_gas_deposit(self.l2_provider(), self.l1_client(), request).await
    }

    async fn get_full_required_deposit_fee(&self, token: Address, to: Option<Address>) -> SdkResult<FullDepositFee> {
        deposit::get_full_required_deposit_fee(self.l2_provider(), self.l1_client(), token, to).await
    }

    async fn get_deposit_allowance_params(
        &self,
        token: Address,
        amount: U256,
    ) -> SdkResult<Vec<AllowanceRequirement>> {
        deposit::get_deposit_allowance_params(self.l2_provider(), self.l1_client(), token, amount).await
    }

    async fn get_base_cost(
        &self,
        l2_gas_limit: U256,
        gas_per_pubdata_byte: Option<U256>,
        gas_price: Option<U256>,
    ) -> SdkResult<U256> {
        deposit::get_base_cost(
            self.l2_provider(),
            self.l1_client(),
            l2_gas_limit,
            gas_per_pubdata_byte,
            gas_price,
        )
        .await
    }

    /// Approves `amount` of `token` for `bridge`, the L1 shared bridge by
    /// default.
    async fn approve_erc20<'a>(
        &'a self,
        token: Address,
        amount: U256,
        bridge: Option<Address>,
    ) -> SdkResult<L1PendingTransaction<'a, Self::L1>> {
        let spender = match bridge {
            Some(bridge) => bridge,
            None => self.l2_provider().l1_shared_bridge_address().await?,
        };
        deposit::approve_erc20(self.l2_provider(), self.l1_client(), token, spender, amount).await
    }

    async fn get_allowance_l1(&self, token: Address, bridge: Option<Address>) -> SdkResult<U256> {
        let spender = match bridge {
            Some(bridge) => bridge,
            None => self.l2_provider().l1_shared_bridge_address().await?,
        };
        deposit::get_allowance_l1(self.l1_client(), token, self.l1_client().address(), spender).await
    }

    async fn get_balance_l1(&self, token: Option<Address>) -> SdkResult<U256> {
        deposit::get_balance_l1(self.l1_client(), self.l1_client().address(), token).await
    }

    async fn l1_token_address(&self, token: Address) -> SdkResult<Address> {
        self.l2_provider().l1_token_address(token).await
    }

    async fn l2_token_address(&self, token: Address) -> SdkResult<Address> {
        self.l2_provider().l2_token_address(token).await
    }

    async fn get_finalize_withdrawal_params(&self, tx_hash: B256, index: usize) -> SdkResult<FinalizeWithdrawalParams> {
        finalizer::get_finalize_withdrawal_params(self.l2_provider(), tx_hash, index).await
    }

    async fn is_withdrawal_finalized(&self, tx_hash: B256, index: usize) -> SdkResult<bool> {
        finalizer::is_withdrawal_finalized(self.l2_provider(), self.l1_client(), tx_hash, index).await
    }

    async fn finalize_withdrawal<'a>(
        &'a self,
        tx_hash: B256,
        index: usize,
    ) -> SdkResult<L1PendingTransaction<'a, Self::L1>> {
        finalizer::finalize_withdrawal(self.l2_provider(), self.l1_client(), tx_hash, index).await
    }

    async fn claim_failed_deposit<'a>(&'a self, deposit_hash: B256) -> SdkResult<L1PendingTransaction<'a, Self::L1>> {
        finalizer::claim_failed_deposit(self.l2_provider(), self.l1_client(), deposit_hash).await
    }
}

/// A private key used on both layers.
pub struct Wallet<L1> {
    signer: PrivateKeySigner,
    provider: RollupProvider,
    l1: L1,
}

impl<L1: L1Client> Wallet<L1> {
    pub fn new(signer: PrivateKeySigner, provider: RollupProvider, l1: L1) -> Self {
        Self { signer, provider, l1 }
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

/// Wallet talking to the L1 and L2 endpoints of `config`.
pub fn connect_wallet(
    config: &NetworkConfig,
    signer: PrivateKeySigner,
) -> SdkResult<Wallet<AlloyL1Client<impl Provider + Clone>>> {
    let provider = RollupProvider::from_config(config)?;
    let l1 = connect_l1_http(config.l1_rpc_url.clone(), signer.clone());
    Ok(Wallet::new(signer, provider, l1))
}

impl<L1: L1Client> L2Capable for Wallet<L1> {
    fn l2_provider(&self) -> &RollupProvider {
        &self.provider
    }

    fn l2_signer(&self) -> &(dyn SignerSync + Send + Sync) {
        &self.signer
    }

    fn address(&self) -> Address {
        self.signer.address()
    }
}

impl<L1: L1Client + 'static> L1Capable for Wallet<L1> {
    type L1 = L1;

    fn l1_client(&self) -> &L1 {
        &self.l1
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;

    #[tokio::test]
    async fn test_connect_wallet_uses_signer_for_both_layers() -> eyre::Result<()> {
        let config = NetworkConfig {
            l1_rpc_url: Url::parse("http://127.0.0.1:8545")?,
            l2_rpc_url: Url::parse("http://127.0.0.1:3050")?,
            polling_interval_ms: 25,
            cache_contract_addresses: true,
        };
        let signer = PrivateKeySigner::random();
        let expected = signer.address();

        let wallet = connect_wallet(&config, signer)?;
        assert_eq!(wallet.address(), expected);
        assert_eq!(wallet.l1_client().address(), expected);
        assert_eq!(wallet.l2_provider().polling_interval(), Duration::from_millis(25));
        assert!(!wallet.l2_provider().caches_contract_addresses());
        Ok(())
    }
}
