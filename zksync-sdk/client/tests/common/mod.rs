#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use alloy_consensus::Transaction;
use alloy_primitives::{address, keccak256, Address, Bloom, Bytes, TxKind, B256, U256, U64};
use alloy_rpc_types_eth::{Log, TransactionReceipt, TransactionRequest};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use jsonrpsee::{
    core::RpcResult,
    server::{Server, ServerHandle},
    types::{ErrorObjectOwned, Params},
    RpcModule,
};
use serde::Serialize;
use serde_json::Value;
use url::Url;
use zksync_sdk::{L1Client, L1FeeData, RollupProvider, SdkError, SdkResult};
use zksync_sdk_types::{
    contracts::{
        IBridgehub, IERC20, IL1Messenger::L1MessageSent, IL1SharedBridge, IL2SharedBridge,
        IZkSyncMainContract::{L2CanonicalTransaction, NewPriorityRequest},
    },
    apply_l1_to_l2_alias, parse_transaction,
    rpc::{BlockSummary, BridgeAddresses, CallRequest, Fee, L2Log, L2RpcTransaction, L2TransactionReceipt},
    L2ToL1Log, L2ToL1LogProof, ParsedTransaction, BOOTLOADER_FORMAL_ADDRESS, ETH_ADDRESS_IN_CONTRACTS,
    L1_MESSENGER_ADDRESS, PRIORITY_OPERATION_L2_TX_TYPE,
};

pub const L2_CHAIN_ID: u64 = 270;
pub const L1_CHAIN_ID: u64 = 9;
pub const BASE_COST: u64 = 1_000_000_000_000;
pub const L2_GAS_ESTIMATE: u64 = 300_000;
pub const L1_GAS_ESTIMATE: u64 = 150_000;
pub const L2_GAS_PRICE: u64 = 250_000_000;
pub const L1_BATCH_NUMBER: u64 = 7;
pub const L1_BATCH_TX_INDEX: u64 = 2;
pub const PROOF_ID: u32 = 4;

pub const BRIDGEHUB: Address = address!("b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1");
pub const MAIN_CONTRACT: Address = address!("d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1");
pub const L1_SHARED_BRIDGE: Address = address!("5151515151515151515151515151515151515151");
pub const L2_SHARED_BRIDGE: Address = address!("5252525252525252525252525252525252525252");
pub const L1_TOKEN: Address = address!("7171717171717171717171717171717171717171");
pub const L2_TOKEN: Address = address!("7272727272727272727272727272727272727272");
pub const BASE_TOKEN: Address = address!("baba000000000000000000000000000000000001");

/// In-memory state of both layers, shared by the mock L2 node and the mock
/// L1 client.
#[derive(Debug, Default)]
pub struct NetworkState {
    pub base_token: Address,
    pub block_number: u64,
    pub l2_nonces: HashMap<Address, u64>,
    pub l2_transactions: HashMap<B256, L2RpcTransaction>,
    pub l2_receipts: HashMap<B256, L2TransactionReceipt>,
    pub l2_raw_transactions: Vec<ParsedTransaction>,
    pub proofs: HashMap<(B256, usize), L2ToL1LogProof>,
    pub l1_to_l2_estimates: Vec<CallRequest>,
    pub calls: HashMap<&'static str, usize>,

    pub l1_chain_id: u64,
    /// Priority operations executed from now on fail on L2.
    pub fail_priority_ops: bool,

    pub l1_balances: HashMap<Address, U256>,
    pub l1_token_balances: HashMap<(Address, Address), U256>,
    pub l1_allowances: HashMap<(Address, Address, Address), U256>,
    pub l1_sent: Vec<TransactionRequest>,
    pub l1_receipts: HashMap<B256, TransactionReceipt>,
    pub finalized_withdrawals: HashSet<(U256, U256)>,
}

pub type SharedState = Arc<Mutex<NetworkState>>;

pub fn lock(state: &SharedState) -> MutexGuard<'_, NetworkState> {
    state.lock().expect("network state lock")
}

pub fn eth_based_state() -> SharedState {
    Arc::new(Mutex::new(NetworkState {
        base_token: ETH_ADDRESS_IN_CONTRACTS,
        block_number: 100,
        l1_chain_id: L1_CHAIN_ID,
        ..Default::default()
    }))
}

/// A chain whose fees are paid in [`BASE_TOKEN`].
pub fn base_token_state() -> SharedState {
    let state = eth_based_state();
    lock(&state).base_token = BASE_TOKEN;
    state
}

pub fn fund_token(state: &SharedState, token: Address, owner: Address, amount: U256) {
    lock(state).l1_token_balances.insert((token, owner), amount);
}

pub fn set_allowance(state: &SharedState, token: Address, owner: Address, spender: Address, amount: U256) {
    lock(state).l1_allowances.insert((token, owner, spender), amount);
}

fn json<T: Serialize>(value: T) -> RpcResult<Value> {
    serde_json::to_value(value).map_err(|e| ErrorObjectOwned::owned(-32603, e.to_string(), None::<()>))
}

fn reverted(reason: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(3, format!("execution reverted: {reason}"), None::<()>)
}

/// A running mock L2 node.
pub struct MockL2Node {
    pub url: Url,
    pub state: SharedState,
    _handle: ServerHandle,
}

impl MockL2Node {
    pub async fn start(state: SharedState) -> eyre::Result<Self> {
        let server = Server::builder().build("127.0.0.1:0").await?;
        let addr = server.local_addr()?;
        let handle = server.start(rpc_module(state.clone())?);

        Ok(Self {
            url: Url::parse(&format!("http://{addr}"))?,
            state,
            _handle: handle,
        })
    }

    pub fn provider(&self) -> eyre::Result<RollupProvider> {
        Ok(RollupProvider::new(self.url.clone(), Duration::from_millis(10), true)?)
    }

    pub fn calls(&self, method: &str) -> usize {
        lock(&self.state).calls.get(method).copied().unwrap_or_default()
    }
}

fn register<F>(module: &mut RpcModule<SharedState>, name: &'static str, handler: F) -> eyre::Result<()>
where
    F: Fn(Params<'_>, &SharedState) -> RpcResult<Value> + Send + Sync + Clone + 'static,
{
    module.register_method(name, move |params, state, _| {
        *lock(state).calls.entry(name).or_default() += 1;
        handler(params, state)
    })?;
    Ok(())
}

fn rpc_module(state: SharedState) -> eyre::Result<RpcModule<SharedState>> {
    let mut module = RpcModule::new(state);

    register(&mut module, "zks_getBridgehubContract", |_, _| json(Some(BRIDGEHUB)))?;
    register(&mut module, "zks_getMainContract", |_, _| json(MAIN_CONTRACT))?;
    register(&mut module, "zks_getBaseTokenL1Address", |_, state| json(lock(state).base_token))?;
    register(&mut module, "zks_getBridgeContracts", |_, _| {
        json(BridgeAddresses {
            l1_shared_default_bridge: Some(L1_SHARED_BRIDGE),
            l2_shared_default_bridge: Some(L2_SHARED_BRIDGE),
            ..Default::default()
        })
    })?;
    register(&mut module, "zks_estimateGasL1ToL2", |params, state| {
        let request: CallRequest = params.one()?;
        lock(state).l1_to_l2_estimates.push(request);
        json(U256::from(L2_GAS_ESTIMATE))
    })?;
    register(&mut module, "zks_estimateFee", |_, _| {
        json(Fee {
            gas_limit: U256::from(L2_GAS_ESTIMATE),
            gas_per_pubdata_limit: U256::from(50_000),
            max_fee_per_gas: U256::from(L2_GAS_PRICE),
            max_priority_fee_per_gas: U256::ZERO,
        })
    })?;
    register(&mut module, "zks_getL2ToL1LogProof", |params, state| {
        let (tx_hash, index): (B256, Option<usize>) = params.parse()?;
        json(lock(state).proofs.get(&(tx_hash, index.unwrap_or_default())).cloned())
    })?;

    register(&mut module, "zks_L1ChainId", |_, state| json(U64::from(lock(state).l1_chain_id)))?;

    register(&mut module, "eth_chainId", |_, _| json(U64::from(L2_CHAIN_ID)))?;
    register(&mut module, "eth_blockNumber", |_, state| json(U64::from(lock(state).block_number)))?;
    register(&mut module, "eth_getBlockByNumber", |_, state| {
        json(Some(BlockSummary {
            number: U64::from(lock(state).block_number),
            hash: B256::repeat_byte(0xcc),
            ..Default::default()
        }))
    })?;
    register(&mut module, "eth_getTransactionByHash", |params, state| {
        let tx_hash: B256 = params.one()?;
        json(lock(state).l2_transactions.get(&tx_hash).cloned())
    })?;
    register(&mut module, "eth_getTransactionReceipt", |params, state| {
        let tx_hash: B256 = params.one()?;
        json(lock(state).l2_receipts.get(&tx_hash).cloned())
    })?;
    register(&mut module, "eth_getTransactionCount", |params, state| {
        let (address, _): (Address, Value) = params.parse()?;
        json(U256::from(lock(state).l2_nonces.get(&address).copied().unwrap_or_default()))
    })?;
    register(&mut module, "eth_gasPrice", |_, _| json(U256::from(L2_GAS_PRICE)))?;
    register(&mut module, "eth_estimateGas", |_, _| json(U256::from(600_000)))?;
    register(&mut module, "eth_getBalance", |_, _| json(U256::from(10u64.pow(18))))?;
    register(&mut module, "eth_call", |params, _| {
        let (request, _): (CallRequest, Value) = params.parse()?;
        json(l2_call(&request)?)
    })?;
    register(&mut module, "eth_sendRawTransaction", |params, state| {
        let tx_bytes: Bytes = params.one()?;
        json(accept_l2_transaction(&mut lock(state), &tx_bytes)?)
    })?;

    Ok(module)
}

fn l2_call(request: &CallRequest) -> RpcResult<Bytes> {
    let data = request.data.clone().unwrap_or_default();
    let selector: [u8; 4] = data
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| reverted("missing selector"))?;

    let to = request.to.unwrap_or_default();
    let output = match selector {
        IL2SharedBridge::l1SharedBridgeCall::SELECTOR if to == L2_SHARED_BRIDGE => L1_SHARED_BRIDGE.abi_encode(),
        IL2SharedBridge::l2TokenAddressCall::SELECTOR if to == L2_SHARED_BRIDGE => {
            let call = IL2SharedBridge::l2TokenAddressCall::abi_decode(&data).map_err(|e| reverted(&e.to_string()))?;
            let l2_token = if call._l1Token == L1_TOKEN { L2_TOKEN } else { Address::ZERO };
            l2_token.abi_encode()
        }
        IL2SharedBridge::l1TokenAddressCall::SELECTOR if to == L2_SHARED_BRIDGE => {
            let call = IL2SharedBridge::l1TokenAddressCall::abi_decode(&data).map_err(|e| reverted(&e.to_string()))?;
            let l1_token = if call._l2Token == L2_TOKEN { L1_TOKEN } else { Address::ZERO };
            l1_token.abi_encode()
        }
        IERC20::balanceOfCall::SELECTOR if to == L2_TOKEN => U256::from(1_000).abi_encode(),
        _ => return Err(reverted("unknown call")),
    };
    Ok(output.into())
}

fn accept_l2_transaction(state: &mut NetworkState, tx_bytes: &Bytes) -> RpcResult<B256> {
    let parsed = parse_transaction(tx_bytes).map_err(|e| reverted(&e.to_string()))?;
    let (tx_hash, from, to, value, input, nonce) = match &parsed {
        ParsedTransaction::Eip712(tx) => (
            tx.tx_hash().map_err(|e| reverted(&e.to_string()))?,
            tx.from(),
            tx.to(),
            tx.value(),
            tx.data().clone(),
            tx.nonce(),
        ),
        ParsedTransaction::Standard(envelope) => {
            let from = match envelope {
                alloy_consensus::TxEnvelope::Eip1559(signed) => signed
                    .signature()
                    .recover_address_from_prehash(&signed.signature_hash())
                    .map_err(|e| reverted(&e.to_string()))?,
                _ => return Err(reverted("unsupported transaction type")),
            };
            (
                *envelope.tx_hash(),
                from,
                envelope.to(),
                envelope.value(),
                envelope.input().clone(),
                U256::from(envelope.nonce()),
            )
        }
    };

    state.block_number += 1;
    *state.l2_nonces.entry(from).or_default() += 1;
    let block_number = Some(U64::from(state.block_number));

    let mut receipt = L2TransactionReceipt {
        transaction_hash: tx_hash,
        block_number,
        l1_batch_number: Some(U64::from(L1_BATCH_NUMBER)),
        l1_batch_tx_index: Some(U64::from(L1_BATCH_TX_INDEX)),
        from,
        to,
        status: Some(U64::from(1)),
        ..Default::default()
    };

    if to == Some(L2_SHARED_BRIDGE) && input.get(..4) == Some(&IL2SharedBridge::withdrawCall::SELECTOR[..]) {
        let call = IL2SharedBridge::withdrawCall::abi_decode(&input).map_err(|e| reverted(&e.to_string()))?;
        let message: Bytes = (call._l1Receiver, L1_TOKEN, call._amount).abi_encode_packed().into();
        record_withdrawal(state, &mut receipt, L2_SHARED_BRIDGE, message);
    }

    state.l2_transactions.insert(
        tx_hash,
        L2RpcTransaction {
            hash: tx_hash,
            from,
            to,
            value,
            input,
            nonce,
            block_number,
            ..Default::default()
        },
    );
    state.l2_receipts.insert(tx_hash, receipt);
    state.l2_raw_transactions.push(parsed);
    Ok(tx_hash)
}

/// Adds the messenger event, the L2->L1 log and its proof of a withdrawal.
fn record_withdrawal(state: &mut NetworkState, receipt: &mut L2TransactionReceipt, sender: Address, message: Bytes) {
    let event = L1MessageSent {
        _sender: sender,
        _hash: keccak256(&message),
        _message: message.clone(),
    };
    let data = event.encode_log_data();
    receipt.logs.push(L2Log {
        address: L1_MESSENGER_ADDRESS,
        topics: data.topics().to_vec(),
        data: data.data.clone(),
        transaction_hash: Some(receipt.transaction_hash),
        ..Default::default()
    });

    let log_index = receipt.l2_to_l1_logs.len();
    receipt.l2_to_l1_logs.push(L2ToL1Log {
        sender: L1_MESSENGER_ADDRESS,
        key: sender.into_word(),
        value: keccak256(&message),
        transaction_hash: receipt.transaction_hash,
        ..Default::default()
    });
    state.proofs.insert(
        (receipt.transaction_hash, log_index),
        L2ToL1LogProof {
            proof: vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
            id: PROOF_ID,
            root: B256::repeat_byte(0xaa),
        },
    );
}

/// Mined priority operation on L2, with its bootloader log and proof.
fn record_priority_op(
    state: &mut NetworkState,
    l2_tx_hash: B256,
    from: Address,
    to: Address,
    value: U256,
    input: Bytes,
    success: bool,
) {
    state.block_number += 1;
    let block_number = Some(U64::from(state.block_number));

    state.l2_transactions.insert(
        l2_tx_hash,
        L2RpcTransaction {
            hash: l2_tx_hash,
            from,
            to: Some(to),
            value,
            input,
            block_number,
            transaction_type: Some(U64::from(PRIORITY_OPERATION_L2_TX_TYPE)),
            ..Default::default()
        },
    );
    state.l2_receipts.insert(
        l2_tx_hash,
        L2TransactionReceipt {
            transaction_hash: l2_tx_hash,
            block_number,
            l1_batch_number: Some(U64::from(L1_BATCH_NUMBER)),
            l1_batch_tx_index: Some(U64::from(L1_BATCH_TX_INDEX)),
            from,
            to: Some(to),
            status: Some(U64::from(success as u64)),
            l2_to_l1_logs: vec![L2ToL1Log {
                sender: BOOTLOADER_FORMAL_ADDRESS,
                key: l2_tx_hash,
                value: if success { B256::with_last_byte(1) } else { B256::ZERO },
                transaction_hash: l2_tx_hash,
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    state.proofs.insert(
        (l2_tx_hash, 0),
        L2ToL1LogProof {
            proof: vec![B256::repeat_byte(0x03)],
            id: PROOF_ID,
            root: B256::repeat_byte(0xab),
        },
    );
}

/// In-memory L1 whose bridge contracts act on the shared network state.
pub struct MockL1 {
    pub address: Address,
    pub state: SharedState,
}

impl MockL1 {
    pub fn new(address: Address, state: SharedState) -> Self {
        lock(&state)
            .l1_balances
            .insert(address, U256::from(10u64) * U256::from(10u64.pow(18)));
        Self { address, state }
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        lock(&self.state).l1_sent.clone()
    }
}

fn l1_receipt(tx_hash: B256, from: Address, to: Address, logs: Vec<Log>) -> SdkResult<TransactionReceipt> {
    let receipt = serde_json::json!({
        "type": "0x2",
        "status": "0x1",
        "cumulativeGasUsed": "0x5208",
        "logs": logs,
        "logsBloom": Bloom::ZERO,
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0xbb),
        "blockNumber": "0x10",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": from,
        "to": to,
        "contractAddress": null,
    });
    serde_json::from_value(receipt).map_err(|e| SdkError::L1Transport(e.to_string()))
}

fn priority_request_log(l2_tx_hash: B256, from: Address, to: Address, value: U256) -> Log {
    let event = NewPriorityRequest {
        txId: U256::from(1),
        txHash: l2_tx_hash,
        expirationTimestamp: 1_700_000_000,
        transaction: L2CanonicalTransaction {
            txType: U256::from(PRIORITY_OPERATION_L2_TX_TYPE),
            from: U256::from_be_slice(from.as_slice()),
            to: U256::from_be_slice(to.as_slice()),
            gasLimit: U256::from(L2_GAS_ESTIMATE),
            gasPerPubdataByteLimit: U256::from(800),
            maxFeePerGas: U256::ZERO,
            maxPriorityFeePerGas: U256::ZERO,
            paymaster: U256::ZERO,
            nonce: U256::from(1),
            value,
            reserved: [U256::ZERO; 4],
            data: Bytes::new(),
            signature: Bytes::new(),
            factoryDeps: vec![],
            paymasterInput: Bytes::new(),
            reservedDynamic: Bytes::new(),
        },
        factoryDeps: vec![],
    };

    Log {
        inner: alloy_primitives::Log {
            address: MAIN_CONTRACT,
            data: event.encode_log_data(),
        },
        ..Default::default()
    }
}

fn l1_revert(reason: &str) -> SdkError {
    SdkError::L1Transport(format!("execution reverted: {reason}"))
}

#[async_trait]
impl L1Client for MockL1 {
    fn address(&self) -> Address {
        self.address
    }

    async fn chain_id(&self) -> SdkResult<u64> {
        Ok(L1_CHAIN_ID)
    }

    async fn call(&self, to: Address, input: Bytes) -> SdkResult<Bytes> {
        let state = lock(&self.state);
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| l1_revert("missing selector"))?;

        let output = match selector {
            IBridgehub::l2TransactionBaseCostCall::SELECTOR if to == BRIDGEHUB => U256::from(BASE_COST).abi_encode(),
            IL1SharedBridge::isWithdrawalFinalizedCall::SELECTOR if to == L1_SHARED_BRIDGE => {
                let call = IL1SharedBridge::isWithdrawalFinalizedCall::abi_decode(&input)
                    .map_err(|e| l1_revert(&e.to_string()))?;
                state
                    .finalized_withdrawals
                    .contains(&(call._l2BatchNumber, call._l2MessageIndex))
                    .abi_encode()
            }
            IERC20::allowanceCall::SELECTOR => {
                let call = IERC20::allowanceCall::abi_decode(&input).map_err(|e| l1_revert(&e.to_string()))?;
                state
                    .l1_allowances
                    .get(&(to, call.owner, call.spender))
                    .copied()
                    .unwrap_or_default()
                    .abi_encode()
            }
            IERC20::balanceOfCall::SELECTOR => {
                let call = IERC20::balanceOfCall::abi_decode(&input).map_err(|e| l1_revert(&e.to_string()))?;
                state
                    .l1_token_balances
                    .get(&(to, call.account))
                    .copied()
                    .unwrap_or_default()
                    .abi_encode()
            }
            IERC20::nameCall::SELECTOR => "Test Token".to_string().abi_encode(),
            IERC20::symbolCall::SELECTOR => "TT".to_string().abi_encode(),
            IERC20::decimalsCall::SELECTOR => <alloy_sol_types::sol_data::Uint<8> as alloy_sol_types::SolType>::abi_encode(&18u8),
            _ => return Err(l1_revert("unknown call")),
        };
        Ok(output.into())
    }

    async fn balance(&self, address: Address) -> SdkResult<U256> {
        Ok(lock(&self.state).l1_balances.get(&address).copied().unwrap_or_default())
    }

    async fn fee_data(&self) -> SdkResult<L1FeeData> {
        Ok(L1FeeData {
            base_fee_per_gas: U256::from(1_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        })
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> SdkResult<u64> {
        Ok(L1_GAS_ESTIMATE)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> SdkResult<B256> {
        let mut state = lock(&self.state);
        let tx_hash = keccak256((state.l1_sent.len() as u64, self.address).abi_encode());
        let to = match tx.to {
            Some(TxKind::Call(to)) => to,
            _ => return Err(l1_revert("contract creation")),
        };
        let input = tx.input.input().cloned().unwrap_or_default();
        let mut logs = vec![];

        if to == BRIDGEHUB && input.get(..4) == Some(&IBridgehub::requestL2TransactionDirectCall::SELECTOR[..]) {
            let call = IBridgehub::requestL2TransactionDirectCall::abi_decode(&input)
                .map_err(|e| l1_revert(&e.to_string()))?;
            let l2_tx_hash = keccak256(tx_hash);
            let success = !state.fail_priority_ops;
            logs.push(priority_request_log(l2_tx_hash, self.address, call._request.l2Contract, call._request.l2Value));
            record_priority_op(
                &mut state,
                l2_tx_hash,
                self.address,
                call._request.l2Contract,
                call._request.l2Value,
                Bytes::new(),
                success,
            );
        } else if to == BRIDGEHUB
            && input.get(..4) == Some(&IBridgehub::requestL2TransactionTwoBridgesCall::SELECTOR[..])
        {
            let request = IBridgehub::requestL2TransactionTwoBridgesCall::abi_decode(&input)
                .map_err(|e| l1_revert(&e.to_string()))?
                ._request;
            let (token, amount, receiver) =
                <(Address, U256, Address)>::abi_decode_params(&request.secondBridgeCalldata)
                    .map_err(|e| l1_revert(&e.to_string()))?;
            let amount = if token == ETH_ADDRESS_IN_CONTRACTS {
                request.secondBridgeValue
            } else {
                amount
            };

            // The second bridge forwards the deposit to its L2 counterpart.
            let l2_input: Bytes = IL2SharedBridge::finalizeDepositCall {
                _l1Sender: self.address,
                _l2Receiver: receiver,
                _l1Token: token,
                _amount: amount,
                _data: Bytes::new(),
            }
            .abi_encode()
            .into();
            let l2_from = apply_l1_to_l2_alias(request.secondBridgeAddress);
            let l2_tx_hash = keccak256(tx_hash);
            let success = !state.fail_priority_ops;
            logs.push(priority_request_log(l2_tx_hash, l2_from, L2_SHARED_BRIDGE, U256::ZERO));
            record_priority_op(
                &mut state,
                l2_tx_hash,
                l2_from,
                L2_SHARED_BRIDGE,
                U256::ZERO,
                l2_input,
                success,
            );
        } else if to == L1_SHARED_BRIDGE
            && input.get(..4) == Some(&IL1SharedBridge::finalizeWithdrawalCall::SELECTOR[..])
        {
            let call = IL1SharedBridge::finalizeWithdrawalCall::abi_decode(&input)
                .map_err(|e| l1_revert(&e.to_string()))?;
            state
                .finalized_withdrawals
                .insert((call._l2BatchNumber, call._l2MessageIndex));
        } else if input.get(..4) == Some(&IERC20::approveCall::SELECTOR[..]) {
            let call = IERC20::approveCall::abi_decode(&input).map_err(|e| l1_revert(&e.to_string()))?;
            state
                .l1_allowances
                .insert((to, self.address, call.spender), call.amount);
        }

        let receipt = l1_receipt(tx_hash, self.address, to, logs)?;
        state.l1_receipts.insert(tx_hash, receipt);
        state.l1_sent.push(tx);
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> SdkResult<Option<TransactionReceipt>> {
        Ok(lock(&self.state).l1_receipts.get(&tx_hash).cloned())
    }
}

/// Registers a failed priority operation on L2 and returns its hash.
pub fn failed_priority_op(state: &SharedState, from: Address) -> B256 {
    let l2_tx_hash = B256::random();
    record_priority_op(&mut lock(state), l2_tx_hash, from, L2_SHARED_BRIDGE, U256::ZERO, Bytes::new(), false);
    l2_tx_hash
}
