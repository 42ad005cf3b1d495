use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use tracing::{debug, info, instrument};
use zksync_sdk_types::{
    apply_l1_to_l2_alias,
    contracts::{IBridgehub, IERC20, IL2SharedBridge},
    encode_bridge_data, is_eth, l1_max_fee_per_gas, normalize_token,
    rpc::{CallRequest, Eip712Meta},
    AllowanceRequirement, DepositCall, DepositRoute, FullDepositFee,
    L1_RECOMMENDED_MIN_ERC20_DEPOSIT_GAS_LIMIT, L1_RECOMMENDED_MIN_ETH_DEPOSIT_GAS_LIMIT,
    REQUIRED_L1_TO_L2_GAS_PER_PUBDATA_LIMIT,
};

use crate::{
    correlator::PriorityOpHandle,
    error::{SdkError, SdkResult},
    l1::{call_l1, ensure_settlement_chain, L1Client, L1PendingTransaction},
    provider::RollupProvider,
    transaction::narrow,
};

/// Deposit of `amount` of the L1 token `token` into the rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    pub token: Address,
    pub amount: U256,
    /// L2 receiver; defaults to the L1 sender.
    pub to: Option<Address>,
    /// L1 bridge to use instead of the default shared bridge.
    pub bridge_address: Option<Address>,
    pub approve_erc20: bool,
    pub approve_base_erc20: bool,
    pub l2_gas_limit: Option<U256>,
    pub gas_per_pubdata_byte: Option<U256>,
    pub refund_recipient: Option<Address>,
    pub operator_tip: U256,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub l1_gas_limit: Option<u64>,
}

impl DepositRequest {
    pub fn new(token: Address, amount: U256) -> Self {
        Self {
            token,
            amount,
            to: None,
            bridge_address: None,
            approve_erc20: false,
            approve_base_erc20: false,
            l2_gas_limit: None,
            gas_per_pubdata_byte: None,
            refund_recipient: None,
            operator_tip: U256::ZERO,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            l1_gas_limit: None,
        }
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn bridge_address(mut self, bridge_address: Address) -> Self {
        self.bridge_address = Some(bridge_address);
        self
    }

    pub fn approve_erc20(mut self, approve: bool) -> Self {
        self.approve_erc20 = approve;
        self
    }

    pub fn approve_base_erc20(mut self, approve: bool) -> Self {
        self.approve_base_erc20 = approve;
        self
    }

    pub fn l2_gas_limit(mut self, l2_gas_limit: U256) -> Self {
        self.l2_gas_limit = Some(l2_gas_limit);
        self
    }

    pub fn gas_per_pubdata_byte(mut self, gas_per_pubdata_byte: U256) -> Self {
        self.gas_per_pubdata_byte = Some(gas_per_pubdata_byte);
        self
    }

    pub fn refund_recipient(mut self, refund_recipient: Address) -> Self {
        self.refund_recipient = Some(refund_recipient);
        self
    }

    pub fn operator_tip(mut self, operator_tip: U256) -> Self {
        self.operator_tip = operator_tip;
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn l1_gas_limit(mut self, l1_gas_limit: u64) -> Self {
        self.l1_gas_limit = Some(l1_gas_limit);
        self
    }
}

/// Resolved L1 fee caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct L1Fees {
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
}

async fn resolve_l1_fees<L: L1Client + ?Sized>(
    l1: &L,
    max_fee_per_gas: Option<U256>,
    max_priority_fee_per_gas: Option<U256>,
) -> SdkResult<L1Fees> {
    if let (Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) = (max_fee_per_gas, max_priority_fee_per_gas) {
        return Ok(L1Fees {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        });
    }

    let fee_data = l1.fee_data().await?;
    let max_priority_fee_per_gas = max_priority_fee_per_gas.unwrap_or(fee_data.max_priority_fee_per_gas);
    let max_fee_per_gas = max_fee_per_gas
        .unwrap_or_else(|| l1_max_fee_per_gas(fee_data.base_fee_per_gas, max_priority_fee_per_gas));
    Ok(L1Fees {
        max_fee_per_gas,
        max_priority_fee_per_gas,
    })
}

/// `bridgehub.l2TransactionBaseCost` for this chain. The gas price defaults
/// to the current L1 fee cap.
pub async fn get_base_cost<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    l2_gas_limit: U256,
    gas_per_pubdata_byte: Option<U256>,
    gas_price: Option<U256>,
) -> SdkResult<U256> {
    let gas_price = match gas_price {
        Some(gas_price) => gas_price,
        None => resolve_l1_fees(l1, None, None).await?.max_fee_per_gas,
    };
    let bridgehub = provider.get_bridgehub_contract_address().await?;
    let chain_id = provider.chain_id().await?;

    call_l1(
        l1,
        bridgehub,
        IBridgehub::l2TransactionBaseCostCall {
            _chainId: U256::from(chain_id),
            _gasPrice: gas_price,
            _l2GasLimit: l2_gas_limit,
            _l2GasPerPubdataByteLimit: gas_per_pubdata_byte
                .unwrap_or(U256::from(REQUIRED_L1_TO_L2_GAS_PER_PUBDATA_LIMIT)),
        },
    )
    .await
}

/// Token metadata handed to the L2 bridge with a bridged deposit.
async fn bridge_data<L: L1Client + ?Sized>(l1: &L, token: Address) -> SdkResult<Bytes> {
    if is_eth(token) {
        return Ok(encode_bridge_data("Ether", "ETH", 18));
    }
    let name = call_l1(l1, token, IERC20::nameCall {}).await?;
    let symbol = call_l1(l1, token, IERC20::symbolCall {}).await?;
    let decimals = call_l1(l1, token, IERC20::decimalsCall {}).await?;
    Ok(encode_bridge_data(&name, &symbol, decimals))
}

/// L2 gas the priority operation of a deposit needs.
async fn estimate_l2_gas_limit<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    route: DepositRoute,
    token: Address,
    amount: U256,
    to: Address,
    gas_per_pubdata_byte: U256,
) -> SdkResult<U256> {
    let from = l1.address();
    let meta = Some(Eip712Meta {
        gas_per_pubdata: gas_per_pubdata_byte,
        ..Default::default()
    });

    let request = if route.is_direct() {
        CallRequest {
            from: Some(from),
            to: Some(to),
            value: Some(amount),
            data: Some(Bytes::new()),
            eip712_meta: meta,
            ..Default::default()
        }
    } else {
        let l1_bridge = provider.l1_shared_bridge_address().await?;
        let l2_bridge = provider.l2_shared_bridge_address().await?;
        let data = IL2SharedBridge::finalizeDepositCall {
            _l1Sender: from,
            _l2Receiver: to,
            _l1Token: token,
            _amount: amount,
            _data: bridge_data(l1, token).await?,
        }
        .abi_encode();

        CallRequest {
            from: Some(apply_l1_to_l2_alias(l1_bridge)),
            to: Some(l2_bridge),
            data: Some(Bytes::from(data)),
            eip712_meta: meta,
            ..Default::default()
        }
    };

    provider.estimate_gas_l1_to_l2(request).await
}

/// L1 transaction carrying a bridgehub request.
fn deposit_transaction(
    sender: Address,
    bridgehub: Address,
    call: &DepositCall,
    fees: L1Fees,
) -> SdkResult<TransactionRequest> {
    Ok(TransactionRequest::default()
        .from(sender)
        .to(bridgehub)
        .value(call.l1_value())
        .input(TransactionInput::new(call.calldata()))
        .max_fee_per_gas(narrow(fees.max_fee_per_gas, "max_fee_per_gas")?)
        .max_priority_fee_per_gas(narrow(fees.max_priority_fee_per_gas, "max_priority_fee_per_gas")?))
}

struct PreparedDeposit {
    call: DepositCall,
    base_token: Address,
    bridgehub: Address,
    l1_shared_bridge: Address,
    fees: L1Fees,
}

impl PreparedDeposit {
    fn transaction(&self, sender: Address) -> SdkResult<TransactionRequest> {
        deposit_transaction(sender, self.bridgehub, &self.call, self.fees)
    }
}

async fn prepare_deposit<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    request: &DepositRequest,
) -> SdkResult<PreparedDeposit> {
    let token = normalize_token(request.token);
    let base_token = normalize_token(provider.get_base_token_contract_address().await?);
    let route = DepositRoute::select(base_token, token);
    let to = request.to.unwrap_or(l1.address());

    let bridgehub = provider.get_bridgehub_contract_address().await?;
    let chain_id = provider.chain_id().await?;
    let l1_shared_bridge = provider.l1_shared_bridge_address().await?;
    let fees = resolve_l1_fees(l1, request.max_fee_per_gas, request.max_priority_fee_per_gas).await?;

    let gas_per_pubdata_byte = request
        .gas_per_pubdata_byte
        .unwrap_or(U256::from(REQUIRED_L1_TO_L2_GAS_PER_PUBDATA_LIMIT));
    let l2_gas_limit = match request.l2_gas_limit {
        Some(l2_gas_limit) => l2_gas_limit,
        None => estimate_l2_gas_limit(provider, l1, route, token, request.amount, to, gas_per_pubdata_byte).await?,
    };
    let base_cost = get_base_cost(
        provider,
        l1,
        l2_gas_limit,
        Some(gas_per_pubdata_byte),
        Some(fees.max_fee_per_gas),
    )
    .await?;
    debug!(?route, %l2_gas_limit, %base_cost, "Prepared deposit");

    Ok(PreparedDeposit {
        call: DepositCall {
            route,
            chain_id,
            token,
            amount: request.amount,
            to,
            shared_bridge: request.bridge_address.unwrap_or(l1_shared_bridge),
            l2_gas_limit,
            gas_per_pubdata_byte,
            refund_recipient: request.refund_recipient.unwrap_or(Address::ZERO),
            base_cost,
            operator_tip: request.operator_tip,
        },
        base_token,
        bridgehub,
        l1_shared_bridge,
        fees,
    })
}

/// ERC-20 allowance `owner` granted `spender` on L1.
pub async fn get_allowance_l1<L: L1Client + ?Sized>(
    l1: &L,
    token: Address,
    owner: Address,
    spender: Address,
) -> SdkResult<U256> {
    call_l1(l1, token, IERC20::allowanceCall { owner, spender }).await
}

/// L1 balance of `address` in ETH, or in `token` when given.
pub async fn get_balance_l1<L: L1Client + ?Sized>(l1: &L, address: Address, token: Option<Address>) -> SdkResult<U256> {
    match token {
        Some(token) if !is_eth(normalize_token(token)) => {
            call_l1(l1, token, IERC20::balanceOfCall { account: address }).await
        }
        _ => l1.balance(address).await,
    }
}

/// Sends `approve(spender, amount)` on the L1 token.
pub async fn approve_erc20<'a, L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &'a L,
    token: Address,
    spender: Address,
    amount: U256,
) -> SdkResult<L1PendingTransaction<'a, L>> {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    let tx = TransactionRequest::default()
        .from(l1.address())
        .to(token)
        .input(TransactionInput::new(data.into()));

    let tx_hash = l1.send_transaction(tx).await?;
    info!(%token, %spender, %amount, %tx_hash, "Sent ERC-20 approval");
    Ok(L1PendingTransaction::new(l1, tx_hash, provider.polling_interval()))
}

/// Allowances the bridge needs before depositing `amount` of `token`.
pub async fn get_deposit_allowance_params<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    token: Address,
    amount: U256,
) -> SdkResult<Vec<AllowanceRequirement>> {
    let token = normalize_token(token);
    let base_token = normalize_token(provider.get_base_token_contract_address().await?);
    let route = DepositRoute::select(base_token, token);
    if route.is_eth_based_chain() {
        return Ok(route.allowance_requirements(base_token, token, amount, U256::ZERO));
    }

    let prepared = prepare_deposit(provider, l1, &DepositRequest::new(token, amount)).await?;
    Ok(route.allowance_requirements(base_token, token, amount, prepared.call.mint_value()))
}

/// ERC-20 holdings of `owner` must cover what the bridge will pull.
async fn ensure_token_balance<L: L1Client + ?Sized>(
    l1: &L,
    owner: Address,
    requirement: &AllowanceRequirement,
) -> SdkResult<()> {
    let available = get_balance_l1(l1, owner, Some(requirement.token)).await?;
    if available < requirement.allowance {
        return Err(SdkError::InsufficientBalance {
            required: requirement.allowance,
            available,
        });
    }
    Ok(())
}

async fn ensure_allowance<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    spender: Address,
    requirement: &AllowanceRequirement,
    approve: bool,
) -> SdkResult<()> {
    let actual = get_allowance_l1(l1, requirement.token, l1.address(), spender).await?;
    if actual >= requirement.allowance {
        return Ok(());
    }
    if !approve {
        return Err(SdkError::InsufficientAllowance {
            token: requirement.token,
            required: requirement.allowance,
            actual,
        });
    }

    approve_erc20(provider, l1, requirement.token, spender, requirement.allowance)
        .await?
        .wait()
        .await?;
    Ok(())
}

/// Deposits through the bridgehub after checking the sender's balance and
/// allowances.
#[instrument(skip_all, fields(token = %request.token, amount = %request.amount))]
pub async fn deposit<'a, L: L1Client + ?Sized>(
    provider: &'a RollupProvider,
    l1: &'a L,
    request: DepositRequest,
) -> SdkResult<PriorityOpHandle<'a, L>> {
    ensure_settlement_chain(provider, l1).await?;
    let sender = l1.address();
    let prepared = prepare_deposit(provider, l1, &request).await?;
    let call = &prepared.call;

    let required = call.l1_value();
    let available = l1.balance(sender).await?;
    if available < required {
        return Err(SdkError::InsufficientBalance { required, available });
    }

    let requirements = call
        .route
        .allowance_requirements(prepared.base_token, call.token, call.amount, call.mint_value());
    for requirement in &requirements {
        ensure_token_balance(l1, sender, requirement).await?;
    }
    for requirement in &requirements {
        let (spender, approve) = if requirement.token == prepared.base_token {
            (prepared.l1_shared_bridge, request.approve_base_erc20)
        } else {
            (call.shared_bridge, request.approve_erc20)
        };
        ensure_allowance(provider, l1, spender, requirement, approve).await?;
    }

    let tx = prepared.transaction(sender)?;
    let l1_gas_limit = match request.l1_gas_limit {
        Some(l1_gas_limit) => l1_gas_limit,
        None => {
            let estimate = l1.estimate_gas(tx.clone()).await?;
            if call.route == DepositRoute::EthToEthBasedChain {
                estimate
            } else {
                estimate.max(L1_RECOMMENDED_MIN_ERC20_DEPOSIT_GAS_LIMIT)
            }
        }
    };

    let l1_tx_hash = l1.send_transaction(tx.gas_limit(l1_gas_limit)).await?;
    info!(%l1_tx_hash, route = ?call.route, value = %required, "Sent deposit");
    Ok(PriorityOpHandle::new(provider, l1, l1_tx_hash))
}

/// L1 gas the deposit transaction would use.
pub async fn estimate_gas_deposit<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    request: DepositRequest,
) -> SdkResult<u64> {
    let prepared = prepare_deposit(provider, l1, &request).await?;
    l1.estimate_gas(prepared.transaction(l1.address())?).await
}

/// Fees of depositing `token` to `to`, estimated with an amount of 1.
#[instrument(skip_all, fields(%token))]
pub async fn get_full_required_deposit_fee<L: L1Client + ?Sized>(
    provider: &RollupProvider,
    l1: &L,
    token: Address,
    to: Option<Address>,
) -> SdkResult<FullDepositFee> {
    let dummy_amount = U256::from(1);
    let sender = l1.address();
    let token = normalize_token(token);

    let mut request = DepositRequest::new(token, dummy_amount);
    request.to = to;
    let prepared = prepare_deposit(provider, l1, &request).await?;
    let base_cost = prepared.call.base_cost;

    if prepared.call.route.is_eth_based_chain() {
        let available = l1.balance(sender).await?;
        if base_cost >= available + dummy_amount {
            let recommended_l1_gas_limit = if is_eth(token) {
                L1_RECOMMENDED_MIN_ETH_DEPOSIT_GAS_LIMIT
            } else {
                L1_RECOMMENDED_MIN_ERC20_DEPOSIT_GAS_LIMIT
            };
            return Err(SdkError::InsufficientBalance {
                required: U256::from(recommended_l1_gas_limit) * prepared.fees.max_fee_per_gas + base_cost,
                available,
            });
        }
        if !is_eth(token) {
            let requirement = AllowanceRequirement {
                token,
                allowance: dummy_amount,
            };
            ensure_allowance(provider, l1, prepared.call.shared_bridge, &requirement, false).await?;
        }
    } else {
        let requirement = AllowanceRequirement {
            token: prepared.base_token,
            allowance: base_cost + prepared.call.operator_tip,
        };
        ensure_allowance(provider, l1, prepared.l1_shared_bridge, &requirement, false).await?;

        if !is_eth(token) && token != prepared.base_token {
            let requirement = AllowanceRequirement {
                token,
                allowance: dummy_amount,
            };
            ensure_allowance(provider, l1, prepared.call.shared_bridge, &requirement, false).await?;
        }
    }

    let l1_gas_limit = l1.estimate_gas(prepared.transaction(sender)?).await?;
    Ok(FullDepositFee {
        base_cost,
        l1_gas_limit: U256::from(l1_gas_limit),
        l2_gas_limit: prepared.call.l2_gas_limit,
        max_fee_per_gas: prepared.fees.max_fee_per_gas,
        max_priority_fee_per_gas: prepared.fees.max_priority_fee_per_gas,
    })
}
