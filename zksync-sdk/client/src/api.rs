use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use zksync_sdk_types::{
    rpc::{
        AccountBalances, BlockDetails, BlockSummary, BridgeAddresses, CallRequest, DetailedOutput, Fee,
        L1BatchDetails, L2RpcTransaction, L2TransactionReceipt, Token, TransactionDetails,
    },
    L2ToL1LogProof,
};

/// Network-specific methods of the L2 node.
#[rpc(client, namespace = "zks")]
pub trait ZksApi {
    #[method(name = "getBridgehubContract")]
    async fn get_bridgehub_contract(&self) -> RpcResult<Option<Address>>;

    #[method(name = "getMainContract")]
    async fn get_main_contract(&self) -> RpcResult<Address>;

    #[method(name = "getBaseTokenL1Address")]
    async fn get_base_token_l1_address(&self) -> RpcResult<Address>;

    #[method(name = "getBridgeContracts")]
    async fn get_bridge_contracts(&self) -> RpcResult<BridgeAddresses>;

    #[method(name = "estimateGasL1ToL2")]
    async fn estimate_gas_l1_to_l2(&self, request: CallRequest) -> RpcResult<U256>;

    #[method(name = "estimateFee")]
    async fn estimate_fee(&self, request: CallRequest) -> RpcResult<Fee>;

    #[method(name = "getL2ToL1LogProof")]
    async fn get_l2_to_l1_log_proof(
        &self,
        tx_hash: B256,
        index: Option<usize>,
    ) -> RpcResult<Option<L2ToL1LogProof>>;

    #[method(name = "getL1BatchDetails")]
    async fn get_l1_batch_details(&self, batch: u64) -> RpcResult<Option<L1BatchDetails>>;

    #[method(name = "getBlockDetails")]
    async fn get_block_details(&self, block: u64) -> RpcResult<Option<BlockDetails>>;

    #[method(name = "getTransactionDetails")]
    async fn get_transaction_details(&self, tx_hash: B256) -> RpcResult<Option<TransactionDetails>>;

    #[method(name = "getConfirmedTokens")]
    async fn get_confirmed_tokens(&self, from: u32, limit: u8) -> RpcResult<Vec<Token>>;

    #[method(name = "getBytecodeByHash")]
    async fn get_bytecode_by_hash(&self, hash: B256) -> RpcResult<Option<Vec<u8>>>;

    #[method(name = "sendRawTransactionWithDetailedOutput")]
    async fn send_raw_transaction_with_detailed_output(&self, tx_bytes: Bytes) -> RpcResult<DetailedOutput>;

    #[method(name = "L1ChainId")]
    async fn l1_chain_id(&self) -> RpcResult<U64>;

    #[method(name = "L1BatchNumber")]
    async fn l1_batch_number(&self) -> RpcResult<U64>;

    #[method(name = "getAllAccountBalances")]
    async fn get_all_account_balances(&self, address: Address) -> RpcResult<AccountBalances>;

    #[method(name = "getTestnetPaymaster")]
    async fn get_testnet_paymaster(&self) -> RpcResult<Option<Address>>;

    #[method(name = "getL1BatchBlockRange")]
    async fn get_l1_batch_block_range(&self, batch: u64) -> RpcResult<Option<(U64, U64)>>;
}

/// The standard methods the SDK needs from the L2 node.
#[rpc(client, namespace = "eth")]
pub trait EthApi {
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    #[method(name = "blockNumber")]
    async fn block_number(&self) -> RpcResult<U64>;

    #[method(name = "getBlockByNumber")]
    async fn get_block_by_number(
        &self,
        block: BlockNumberOrTag,
        full_transactions: bool,
    ) -> RpcResult<Option<BlockSummary>>;

    #[method(name = "getTransactionByHash")]
    async fn get_transaction_by_hash(&self, tx_hash: B256) -> RpcResult<Option<L2RpcTransaction>>;

    #[method(name = "getTransactionReceipt")]
    async fn get_transaction_receipt(&self, tx_hash: B256) -> RpcResult<Option<L2TransactionReceipt>>;

    #[method(name = "getTransactionCount")]
    async fn get_transaction_count(&self, address: Address, block: BlockNumberOrTag) -> RpcResult<U256>;

    #[method(name = "gasPrice")]
    async fn gas_price(&self) -> RpcResult<U256>;

    #[method(name = "estimateGas")]
    async fn estimate_gas(&self, request: CallRequest) -> RpcResult<U256>;

    #[method(name = "call")]
    async fn call(&self, request: CallRequest, block: BlockNumberOrTag) -> RpcResult<Bytes>;

    #[method(name = "sendRawTransaction")]
    async fn send_raw_transaction(&self, tx_bytes: Bytes) -> RpcResult<B256>;

    #[method(name = "getBalance")]
    async fn get_balance(&self, address: Address, block: BlockNumberOrTag) -> RpcResult<U256>;
}
