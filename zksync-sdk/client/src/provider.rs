use std::{future::Future, net::IpAddr, time::Duration};

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::{Host, Url};
use zksync_sdk_types::{
    contracts::{IERC20, IL2SharedBridge},
    normalize_token,
    rpc::{
        AccountBalances, BlockDetails, BlockSummary, BridgeAddresses, CallRequest, DetailedOutput, Fee,
        L1BatchDetails, L2RpcTransaction, L2TransactionReceipt, Token, TransactionDetails,
        TransactionStatus,
    },
    L2ToL1LogProof, L2_BASE_TOKEN_ADDRESS, LEGACY_ETH_ADDRESS,
};

use crate::{
    api::{EthApiClient, ZksApiClient},
    config::NetworkConfig,
    error::{SdkError, SdkResult},
};

/// Addresses that never change for the lifetime of a network. Each one is
/// resolved on first use and kept afterwards.
#[derive(Debug, Default)]
pub struct ContractAddresses {
    bridgehub: OnceCell<Address>,
    main_contract: OnceCell<Address>,
    base_token: OnceCell<Address>,
    bridges: OnceCell<BridgeAddresses>,
}

async fn memoized<T, F, Fut>(cell: Option<&OnceCell<T>>, resolve: F) -> SdkResult<T>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = SdkResult<T>>,
{
    match cell {
        Some(cell) => cell.get_or_try_init(resolve).await.cloned(),
        None => resolve().await,
    }
}

/// Loopback hosts serve development networks that are redeployed often, so
/// their addresses are never cached.
pub fn is_local_endpoint(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Client of an L2 node.
pub struct RollupProvider {
    client: HttpClient,
    url: Url,
    polling_interval: Duration,
    addresses: Option<ContractAddresses>,
}

impl RollupProvider {
    pub fn new(url: Url, polling_interval: Duration, cache_contract_addresses: bool) -> SdkResult<Self> {
        let client = HttpClientBuilder::default()
            .build(url.as_str())
            .map_err(SdkError::rpc("connect", url.as_str().to_string()))?;

        let cache = cache_contract_addresses && !is_local_endpoint(&url);
        info!(%url, ?polling_interval, cache, "Created rollup provider");

        Ok(Self {
            client,
            url,
            polling_interval,
            addresses: cache.then(ContractAddresses::default),
        })
    }

    pub fn from_config(config: &NetworkConfig) -> SdkResult<Self> {
        Self::new(
            config.l2_rpc_url.clone(),
            config.polling_interval(),
            config.cache_contract_addresses,
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn caches_contract_addresses(&self) -> bool {
        self.addresses.is_some()
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub async fn get_bridgehub_contract_address(&self) -> SdkResult<Address> {
        memoized(self.addresses.as_ref().map(|a| &a.bridgehub), || async {
            let address = ZksApiClient::get_bridgehub_contract(&self.client)
                .await
                .map_err(SdkError::rpc("zks_getBridgehubContract", ()))?;
            address.ok_or(SdkError::BridgeNotFound("bridgehub"))
        })
        .await
    }

    pub async fn get_main_contract_address(&self) -> SdkResult<Address> {
        memoized(self.addresses.as_ref().map(|a| &a.main_contract), || async {
            ZksApiClient::get_main_contract(&self.client)
                .await
                .map_err(SdkError::rpc("zks_getMainContract", ()))
        })
        .await
    }

    /// L1 address of the token fees are paid in.
    pub async fn get_base_token_contract_address(&self) -> SdkResult<Address> {
        memoized(self.addresses.as_ref().map(|a| &a.base_token), || async {
            ZksApiClient::get_base_token_l1_address(&self.client)
                .await
                .map_err(SdkError::rpc("zks_getBaseTokenL1Address", ()))
        })
        .await
    }

    pub async fn get_default_bridge_addresses(&self) -> SdkResult<BridgeAddresses> {
        memoized(self.addresses.as_ref().map(|a| &a.bridges), || async {
            ZksApiClient::get_bridge_contracts(&self.client)
                .await
                .map_err(SdkError::rpc("zks_getBridgeContracts", ()))
        })
        .await
    }

    pub async fn l2_shared_bridge_address(&self) -> SdkResult<Address> {
        self.get_default_bridge_addresses()
            .await?
            .l2_shared_default_bridge
            .ok_or(SdkError::BridgeNotFound("L2 shared"))
    }

    pub async fn l1_shared_bridge_address(&self) -> SdkResult<Address> {
        self.get_default_bridge_addresses()
            .await?
            .l1_shared_default_bridge
            .ok_or(SdkError::BridgeNotFound("L1 shared"))
    }

    pub async fn is_eth_based_chain(&self) -> SdkResult<bool> {
        Ok(zksync_sdk_types::is_eth(self.get_base_token_contract_address().await?))
    }

    pub async fn is_base_token(&self, token: Address) -> SdkResult<bool> {
        let base_token = self.get_base_token_contract_address().await?;
        Ok(normalize_token(token) == normalize_token(base_token) || token == L2_BASE_TOKEN_ADDRESS)
    }

    /// L2 address of the token bridged from `token` on L1.
    pub async fn l2_token_address(&self, token: Address) -> SdkResult<Address> {
        let token = normalize_token(token);
        if normalize_token(self.get_base_token_contract_address().await?) == token {
            return Ok(L2_BASE_TOKEN_ADDRESS);
        }

        let bridge = self.l2_shared_bridge_address().await?;
        self.call_contract(bridge, IL2SharedBridge::l2TokenAddressCall { _l1Token: token })
            .await
    }

    /// L1 address of the token bridged to `token` on L2.
    pub async fn l1_token_address(&self, token: Address) -> SdkResult<Address> {
        if token == LEGACY_ETH_ADDRESS {
            return Ok(LEGACY_ETH_ADDRESS);
        }
        if token == L2_BASE_TOKEN_ADDRESS {
            return self.get_base_token_contract_address().await;
        }

        let bridge = self.l2_shared_bridge_address().await?;
        self.call_contract(bridge, IL2SharedBridge::l1TokenAddressCall { _l2Token: token })
            .await
    }

    /// Balance of `address` in `token` (an L2 address), or in the base token
    /// when `token` is `None`.
    pub async fn get_token_balance(&self, address: Address, token: Option<Address>) -> SdkResult<U256> {
        match token {
            Some(token) if token != L2_BASE_TOKEN_ADDRESS => {
                self.call_contract(token, IERC20::balanceOfCall { account: address })
                    .await
            }
            _ => self.get_balance(address, BlockNumberOrTag::Latest).await,
        }
    }

    /// `eth_call` of a typed contract call against the latest block.
    pub async fn call_contract<C: SolCall>(&self, to: Address, call: C) -> SdkResult<C::Return> {
        let output = self
            .call(CallRequest::call(to, call.abi_encode().into()), BlockNumberOrTag::Latest)
            .await?;
        C::abi_decode_returns(&output).map_err(SdkError::abi_decode(C::SIGNATURE))
    }

    pub async fn transaction_status(&self, tx_hash: B256) -> SdkResult<TransactionStatus> {
        let Some(tx) = self.get_transaction(tx_hash).await? else {
            return Ok(TransactionStatus::NotFound);
        };
        let Some(block_number) = tx.block_number else {
            return Ok(TransactionStatus::Processing);
        };

        let finalized = self.get_block_by_number(BlockNumberOrTag::Finalized).await?;
        debug!(%tx_hash, ?finalized, "Fetched finalized block");
        match finalized {
            Some(block) if block.number >= block_number => Ok(TransactionStatus::Finalized),
            _ => Ok(TransactionStatus::Committed),
        }
    }

    pub async fn estimate_gas_l1_to_l2(&self, request: CallRequest) -> SdkResult<U256> {
        ZksApiClient::estimate_gas_l1_to_l2(&self.client, request.clone())
            .await
            .map_err(SdkError::rpc("zks_estimateGasL1ToL2", request))
    }

    pub async fn estimate_fee(&self, request: CallRequest) -> SdkResult<Fee> {
        ZksApiClient::estimate_fee(&self.client, request.clone())
            .await
            .map_err(SdkError::rpc("zks_estimateFee", request))
    }

    pub async fn get_l2_to_l1_log_proof(&self, tx_hash: B256, index: Option<usize>) -> SdkResult<Option<L2ToL1LogProof>> {
        ZksApiClient::get_l2_to_l1_log_proof(&self.client, tx_hash, index)
            .await
            .map_err(SdkError::rpc("zks_getL2ToL1LogProof", (tx_hash, index)))
    }

    pub async fn get_l1_batch_details(&self, batch: u64) -> SdkResult<Option<L1BatchDetails>> {
        ZksApiClient::get_l1_batch_details(&self.client, batch)
            .await
            .map_err(SdkError::rpc("zks_getL1BatchDetails", batch))
    }

    pub async fn get_block_details(&self, block: u64) -> SdkResult<Option<BlockDetails>> {
        ZksApiClient::get_block_details(&self.client, block)
            .await
            .map_err(SdkError::rpc("zks_getBlockDetails", block))
    }

    pub async fn get_transaction_details(&self, tx_hash: B256) -> SdkResult<Option<TransactionDetails>> {
        ZksApiClient::get_transaction_details(&self.client, tx_hash)
            .await
            .map_err(SdkError::rpc("zks_getTransactionDetails", tx_hash))
    }

    pub async fn get_confirmed_tokens(&self, from: u32, limit: u8) -> SdkResult<Vec<Token>> {
        ZksApiClient::get_confirmed_tokens(&self.client, from, limit)
            .await
            .map_err(SdkError::rpc("zks_getConfirmedTokens", (from, limit)))
    }

    pub async fn get_bytecode_by_hash(&self, hash: B256) -> SdkResult<Option<Bytes>> {
        ZksApiClient::get_bytecode_by_hash(&self.client, hash)
            .await
            .map(|bytecode| bytecode.map(Bytes::from))
            .map_err(SdkError::rpc("zks_getBytecodeByHash", hash))
    }

    pub async fn send_raw_transaction_with_detailed_output(&self, tx_bytes: Bytes) -> SdkResult<DetailedOutput> {
        ZksApiClient::send_raw_transaction_with_detailed_output(&self.client, tx_bytes.clone())
            .await
            .map_err(SdkError::rpc("zks_sendRawTransactionWithDetailedOutput", tx_bytes))
    }

    pub async fn l1_chain_id(&self) -> SdkResult<u64> {
        ZksApiClient::l1_chain_id(&self.client)
            .await
            .map(|id| id.to::<u64>())
            .map_err(SdkError::rpc("zks_L1ChainId", ()))
    }

    pub async fn l1_batch_number(&self) -> SdkResult<u64> {
        ZksApiClient::l1_batch_number(&self.client)
            .await
            .map(|number| number.to::<u64>())
            .map_err(SdkError::rpc("zks_L1BatchNumber", ()))
    }

    pub async fn get_all_account_balances(&self, address: Address) -> SdkResult<AccountBalances> {
        ZksApiClient::get_all_account_balances(&self.client, address)
            .await
            .map_err(SdkError::rpc("zks_getAllAccountBalances", address))
    }

    pub async fn get_testnet_paymaster(&self) -> SdkResult<Option<Address>> {
        ZksApiClient::get_testnet_paymaster(&self.client)
            .await
            .map_err(SdkError::rpc("zks_getTestnetPaymaster", ()))
    }

    pub async fn get_l1_batch_block_range(&self, batch: u64) -> SdkResult<Option<(u64, u64)>> {
        ZksApiClient::get_l1_batch_block_range(&self.client, batch)
            .await
            .map(|range| range.map(|(start, end)| (start.to::<u64>(), end.to::<u64>())))
            .map_err(SdkError::rpc("zks_getL1BatchBlockRange", batch))
    }

    pub async fn chain_id(&self) -> SdkResult<u64> {
        EthApiClient::chain_id(&self.client)
            .await
            .map(|id| id.to::<u64>())
            .map_err(SdkError::rpc("eth_chainId", ()))
    }

    pub async fn block_number(&self) -> SdkResult<u64> {
        EthApiClient::block_number(&self.client)
            .await
            .map(|number| number.to::<u64>())
            .map_err(SdkError::rpc("eth_blockNumber", ()))
    }

    pub async fn get_block_by_number(&self, block: BlockNumberOrTag) -> SdkResult<Option<BlockSummary>> {
        EthApiClient::get_block_by_number(&self.client, block, false)
            .await
            .map_err(SdkError::rpc("eth_getBlockByNumber", block))
    }

    pub async fn get_transaction(&self, tx_hash: B256) -> SdkResult<Option<L2RpcTransaction>> {
        EthApiClient::get_transaction_by_hash(&self.client, tx_hash)
            .await
            .map_err(SdkError::rpc("eth_getTransactionByHash", tx_hash))
    }

    pub async fn get_transaction_receipt(&self, tx_hash: B256) -> SdkResult<Option<L2TransactionReceipt>> {
        EthApiClient::get_transaction_receipt(&self.client, tx_hash)
            .await
            .map_err(SdkError::rpc("eth_getTransactionReceipt", tx_hash))
    }

    pub async fn get_transaction_count(&self, address: Address, block: BlockNumberOrTag) -> SdkResult<U256> {
        EthApiClient::get_transaction_count(&self.client, address, block)
            .await
            .map_err(SdkError::rpc("eth_getTransactionCount", (address, block)))
    }

    pub async fn gas_price(&self) -> SdkResult<U256> {
        EthApiClient::gas_price(&self.client)
            .await
            .map_err(SdkError::rpc("eth_gasPrice", ()))
    }

    pub async fn estimate_gas(&self, request: CallRequest) -> SdkResult<U256> {
        EthApiClient::estimate_gas(&self.client, request.clone())
            .await
            .map_err(SdkError::rpc("eth_estimateGas", request))
    }

    pub async fn call(&self, request: CallRequest, block: BlockNumberOrTag) -> SdkResult<Bytes> {
        EthApiClient::call(&self.client, request.clone(), block)
            .await
            .map_err(SdkError::rpc("eth_call", (request, block)))
    }

    pub async fn send_raw_transaction(&self, tx_bytes: Bytes) -> SdkResult<B256> {
        EthApiClient::send_raw_transaction(&self.client, tx_bytes.clone())
            .await
            .map_err(SdkError::rpc("eth_sendRawTransaction", tx_bytes))
    }

    pub async fn get_balance(&self, address: Address, block: BlockNumberOrTag) -> SdkResult<U256> {
        EthApiClient::get_balance(&self.client, address, block)
            .await
            .map_err(SdkError::rpc("eth_getBalance", (address, block)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_local_endpoint_detection() -> eyre::Result<()> {
        assert!(is_local_endpoint(&Url::parse("http://localhost:3050")?));
        assert!(is_local_endpoint(&Url::parse("http://127.0.0.1:3050")?));
        assert!(is_local_endpoint(&Url::parse("http://[::1]:3050")?));
        assert!(!is_local_endpoint(&Url::parse("https://mainnet.era.zksync.io")?));
        assert!(!is_local_endpoint(&Url::parse("http://10.0.0.1:3050")?));
        Ok(())
    }

    #[tokio::test]
    async fn test_memoized_resolves_once() -> eyre::Result<()> {
        let cell = OnceCell::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let address = memoized(Some(&cell), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Address::repeat_byte(0x01))
            })
            .await?;
            assert_eq!(address, Address::repeat_byte(0x01));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_memoized_failure_is_not_cached() -> eyre::Result<()> {
        let cell = OnceCell::new();

        let first = memoized(Some(&cell), || async { Err(SdkError::BridgeNotFound("bridgehub")) }).await;
        assert!(first.is_err());

        let second = memoized(Some(&cell), || async { Ok(Address::repeat_byte(0x02)) }).await?;
        assert_eq!(second, Address::repeat_byte(0x02));
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_memo_always_resolves() -> eyre::Result<()> {
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            memoized::<Address, _, _>(None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Address::ZERO)
            })
            .await?;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_loopback_provider_disables_cache() -> eyre::Result<()> {
        let provider = RollupProvider::new(Url::parse("http://127.0.0.1:3050")?, Duration::from_millis(10), true)?;
        assert!(!provider.caches_contract_addresses());

        let provider = RollupProvider::new(Url::parse("https://node.example.org")?, Duration::from_millis(10), true)?;
        assert!(provider.caches_contract_addresses());

        let provider = RollupProvider::new(Url::parse("https://node.example.org")?, Duration::from_millis(10), false)?;
        assert!(!provider.caches_contract_addresses());
        Ok(())
    }
}
