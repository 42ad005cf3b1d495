use std::time::Duration;

use alloy_eips::BlockNumberOrTag;
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolCall;
use alloy_transport::TransportError;
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::{SdkError, SdkResult},
    provider::RollupProvider,
};

/// Current L1 fee market parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L1FeeData {
    pub base_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Everything the SDK needs from L1: contract reads, fee data and sending
/// transactions from a single account.
#[async_trait]
pub trait L1Client: Send + Sync {
    /// Account that sends the L1 transactions.
    fn address(&self) -> Address;

    async fn chain_id(&self) -> SdkResult<u64>;

    async fn call(&self, to: Address, input: Bytes) -> SdkResult<Bytes>;

    async fn balance(&self, address: Address) -> SdkResult<U256>;

    async fn fee_data(&self) -> SdkResult<L1FeeData>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> SdkResult<u64>;

    /// Signs and broadcasts `tx`, returning its hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> SdkResult<B256>;

    async fn transaction_receipt(&self, tx_hash: B256) -> SdkResult<Option<TransactionReceipt>>;
}

/// `eth_call` of a typed contract call on L1.
pub async fn call_l1<L, C>(l1: &L, to: Address, call: C) -> SdkResult<C::Return>
where
    L: L1Client + ?Sized,
    C: SolCall,
{
    let output = l1.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&output).map_err(SdkError::abi_decode(C::SIGNATURE))
}

/// Fails when `l1` is connected to a different chain than the one the L2
/// node settles on.
pub async fn ensure_settlement_chain<L: L1Client + ?Sized>(provider: &RollupProvider, l1: &L) -> SdkResult<()> {
    let expected = provider.l1_chain_id().await?;
    let actual = l1.chain_id().await?;
    if expected != actual {
        return Err(SdkError::L1ChainMismatch { expected, actual });
    }
    Ok(())
}

/// Polls for the receipt of an L1 transaction until it exists. A receipt with
/// a failed status is reported as [`SdkError::L1Reverted`].
pub async fn wait_for_l1_receipt<L>(l1: &L, tx_hash: B256, polling_interval: Duration) -> SdkResult<TransactionReceipt>
where
    L: L1Client + ?Sized,
{
    loop {
        metrics::counter!("zksync_sdk_polling_iterations_total", "loop" => "l1_receipt").increment(1);

        if let Some(receipt) = l1.transaction_receipt(tx_hash).await? {
            if !receipt.status() {
                return Err(SdkError::L1Reverted(tx_hash));
            }
            info!(%tx_hash, block_number = ?receipt.block_number, "L1 transaction included");
            return Ok(receipt);
        }

        debug!(%tx_hash, "L1 receipt not available yet");
        tokio::time::sleep(polling_interval).await;
    }
}

/// A submitted L1 transaction.
pub struct L1PendingTransaction<'a, L: ?Sized> {
    l1: &'a L,
    tx_hash: B256,
    polling_interval: Duration,
}

impl<'a, L: L1Client + ?Sized> L1PendingTransaction<'a, L> {
    pub fn new(l1: &'a L, tx_hash: B256, polling_interval: Duration) -> Self {
        Self {
            l1,
            tx_hash,
            polling_interval,
        }
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    pub async fn wait(&self) -> SdkResult<TransactionReceipt> {
        wait_for_l1_receipt(self.l1, self.tx_hash, self.polling_interval).await
    }
}

fn l1_transport(method: &'static str) -> impl FnOnce(TransportError) -> SdkError {
    move |e| SdkError::L1Transport(format!("{method} failed: {e}"))
}

/// [`L1Client`] over an alloy provider whose wallet signs for `address`.
#[derive(Debug, Clone)]
pub struct AlloyL1Client<P> {
    provider: P,
    address: Address,
}

impl<P: Provider> AlloyL1Client<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// [`AlloyL1Client`] over HTTP that fills nonce, gas and chain id and signs
/// with `signer`.
pub fn connect_l1_http(url: Url, signer: PrivateKeySigner) -> AlloyL1Client<impl Provider + Clone> {
    let address = signer.address();
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);
    AlloyL1Client::new(provider, address)
}

#[async_trait]
impl<P: Provider + Send + Sync> L1Client for AlloyL1Client<P> {
    fn address(&self) -> Address {
        self.address
    }

    async fn chain_id(&self) -> SdkResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(l1_transport("eth_chainId"))
    }

    async fn call(&self, to: Address, input: Bytes) -> SdkResult<Bytes> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(input));
        self.provider.call(tx).await.map_err(l1_transport("eth_call"))
    }

    async fn balance(&self, address: Address) -> SdkResult<U256> {
        self.provider
            .get_balance(address)
            .await
            .map_err(l1_transport("eth_getBalance"))
    }

    async fn fee_data(&self) -> SdkResult<L1FeeData> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(l1_transport("eth_getBlockByNumber"))?
            .ok_or_else(|| SdkError::L1Transport("latest block is not available".to_string()))?;
        let max_priority_fee_per_gas = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(l1_transport("eth_maxPriorityFeePerGas"))?;

        Ok(L1FeeData {
            base_fee_per_gas: U256::from(block.header.base_fee_per_gas.unwrap_or_default()),
            max_priority_fee_per_gas: U256::from(max_priority_fee_per_gas),
        })
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> SdkResult<u64> {
        self.provider
            .estimate_gas(tx)
            .await
            .map_err(l1_transport("eth_estimateGas"))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> SdkResult<B256> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(l1_transport("eth_sendTransaction"))?;
        let tx_hash = *pending.tx_hash();
        info!(%tx_hash, "Sent L1 transaction");
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> SdkResult<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(l1_transport("eth_getTransactionReceipt"))
    }
}
