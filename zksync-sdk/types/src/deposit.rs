use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{is_eth, normalize_token, ETH_ADDRESS_IN_CONTRACTS},
    contracts::IBridgehub,
};

/// How a deposit is routed through the bridgehub, determined by the chain's
/// base token and the deposited token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositRoute {
    EthToEthBasedChain,
    TokenToEthBasedChain,
    BaseTokenToNonEthBasedChain,
    EthToNonEthBasedChain,
    NonBaseTokenToNonEthBasedChain,
}

impl DepositRoute {
    pub fn select(base_token: Address, token: Address) -> Self {
        let base_token = normalize_token(base_token);
        let token = normalize_token(token);

        match (is_eth(base_token), is_eth(token)) {
            (true, true) => Self::EthToEthBasedChain,
            (true, false) => Self::TokenToEthBasedChain,
            (false, true) => Self::EthToNonEthBasedChain,
            (false, false) if token == base_token => Self::BaseTokenToNonEthBasedChain,
            (false, false) => Self::NonBaseTokenToNonEthBasedChain,
        }
    }

    /// Routes that call `requestL2TransactionDirect`; the rest go through
    /// `requestL2TransactionTwoBridges`.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::EthToEthBasedChain | Self::BaseTokenToNonEthBasedChain)
    }

    pub fn is_eth_based_chain(&self) -> bool {
        matches!(self, Self::EthToEthBasedChain | Self::TokenToEthBasedChain)
    }

    /// `baseCost + tip`, plus the amount when the deposited token is the one
    /// fees are paid in.
    pub fn mint_value(&self, base_cost: U256, operator_tip: U256, amount: U256) -> U256 {
        let fee = base_cost + operator_tip;
        if self.is_direct() {
            fee + amount
        } else {
            fee
        }
    }

    /// ETH attached to the L1 transaction.
    pub fn l1_value(&self, mint_value: U256, amount: U256) -> U256 {
        match self {
            Self::EthToEthBasedChain | Self::TokenToEthBasedChain => mint_value,
            Self::EthToNonEthBasedChain => amount,
            Self::BaseTokenToNonEthBasedChain | Self::NonBaseTokenToNonEthBasedChain => U256::ZERO,
        }
    }

    /// ERC-20 allowances the shared bridge needs before the deposit.
    pub fn allowance_requirements(
        &self,
        base_token: Address,
        token: Address,
        amount: U256,
        mint_value: U256,
    ) -> Vec<AllowanceRequirement> {
        match self {
            Self::EthToEthBasedChain => vec![],
            Self::TokenToEthBasedChain => vec![AllowanceRequirement {
                token,
                allowance: amount,
            }],
            Self::BaseTokenToNonEthBasedChain | Self::EthToNonEthBasedChain => {
                vec![AllowanceRequirement {
                    token: base_token,
                    allowance: mint_value,
                }]
            }
            Self::NonBaseTokenToNonEthBasedChain => vec![
                AllowanceRequirement {
                    token: base_token,
                    allowance: mint_value,
                },
                AllowanceRequirement {
                    token,
                    allowance: amount,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceRequirement {
    pub token: Address,
    pub allowance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullDepositFee {
    pub base_cost: U256,
    pub l1_gas_limit: U256,
    pub l2_gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// L1 fee cap used when the caller does not supply one.
pub fn l1_max_fee_per_gas(base_fee: U256, max_priority_fee_per_gas: U256) -> U256 {
    base_fee * U256::from(3) / U256::from(2) + max_priority_fee_per_gas
}

/// `abi.encode(abi.encode(name), abi.encode(symbol), abi.encode(decimals))`,
/// the token metadata the L2 bridge receives with a first deposit.
pub fn encode_bridge_data(name: &str, symbol: &str, decimals: u8) -> Bytes {
    (
        Bytes::from(name.to_string().abi_encode()),
        Bytes::from(symbol.to_string().abi_encode()),
        Bytes::from(U256::from(decimals).abi_encode()),
    )
        .abi_encode_params()
        .into()
}

/// Calldata the shared bridge receives as the second bridge:
/// `abi.encode(token, amount, l2Receiver)`.
pub fn encode_second_bridge_calldata(token: Address, amount: U256, l2_receiver: Address) -> Bytes {
    (token, amount, l2_receiver).abi_encode_params().into()
}

/// Fully resolved bridgehub request for one deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositCall {
    pub route: DepositRoute,
    pub chain_id: u64,
    pub token: Address,
    pub amount: U256,
    pub to: Address,
    pub shared_bridge: Address,
    pub l2_gas_limit: U256,
    pub gas_per_pubdata_byte: U256,
    pub refund_recipient: Address,
    pub base_cost: U256,
    pub operator_tip: U256,
}

impl DepositCall {
    pub fn mint_value(&self) -> U256 {
        self.route.mint_value(self.base_cost, self.operator_tip, self.amount)
    }

    pub fn l1_value(&self) -> U256 {
        self.route.l1_value(self.mint_value(), self.amount)
    }

    pub fn calldata(&self) -> Bytes {
        if self.route.is_direct() {
            IBridgehub::requestL2TransactionDirectCall {
                _request: IBridgehub::L2TransactionRequestDirect {
                    chainId: U256::from(self.chain_id),
                    mintValue: self.mint_value(),
                    l2Contract: self.to,
                    l2Value: self.amount,
                    l2Calldata: Bytes::new(),
                    l2GasLimit: self.l2_gas_limit,
                    l2GasPerPubdataByteLimit: self.gas_per_pubdata_byte,
                    factoryDeps: vec![],
                    refundRecipient: self.refund_recipient,
                },
            }
            .abi_encode()
            .into()
        } else {
            let (second_bridge_value, second_bridge_calldata) = match self.route {
                DepositRoute::EthToNonEthBasedChain => (
                    self.amount,
                    encode_second_bridge_calldata(ETH_ADDRESS_IN_CONTRACTS, U256::ZERO, self.to),
                ),
                _ => (
                    U256::ZERO,
                    encode_second_bridge_calldata(self.token, self.amount, self.to),
                ),
            };

            IBridgehub::requestL2TransactionTwoBridgesCall {
                _request: IBridgehub::L2TransactionRequestTwoBridgesOuter {
                    chainId: U256::from(self.chain_id),
                    mintValue: self.mint_value(),
                    l2Value: U256::ZERO,
                    l2GasLimit: self.l2_gas_limit,
                    l2GasPerPubdataByteLimit: self.gas_per_pubdata_byte,
                    refundRecipient: self.refund_recipient,
                    secondBridgeAddress: self.shared_bridge,
                    secondBridgeValue: second_bridge_value,
                    secondBridgeCalldata: second_bridge_calldata,
                },
            }
            .abi_encode()
            .into()
        }
    }
}
