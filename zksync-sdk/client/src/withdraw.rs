use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use tracing::debug;
use zksync_sdk_types::{
    contracts::{IERC20, IL2BaseToken, IL2SharedBridge},
    rpc::{CallRequest, Eip712Meta},
    PaymasterParams, DEFAULT_GAS_PER_PUBDATA_LIMIT, ETH_ADDRESS_IN_CONTRACTS, L2_BASE_TOKEN_ADDRESS,
    LEGACY_ETH_ADDRESS,
};

use crate::{
    error::{SdkError, SdkResult},
    provider::RollupProvider,
};

/// Withdrawal of `amount` of the L2 token `token` back to L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawRequest {
    pub token: Address,
    pub amount: U256,
    /// L1 receiver; defaults to the sender.
    pub to: Option<Address>,
    /// L2 bridge to use instead of the default shared bridge.
    pub bridge_address: Option<Address>,
    pub paymaster_params: Option<PaymasterParams>,
    /// Explicit value; must match `amount` for base token withdrawals.
    pub value: Option<U256>,
}

impl WithdrawRequest {
    pub fn new(token: Address, amount: U256) -> Self {
        Self {
            token,
            amount,
            to: None,
            bridge_address: None,
            paymaster_params: None,
            value: None,
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

    pub fn paymaster_params(mut self, paymaster_params: PaymasterParams) -> Self {
        self.paymaster_params = Some(paymaster_params);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// Transfer of `amount` on L2, in the base token when `token` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    pub amount: U256,
    pub token: Option<Address>,
    pub paymaster_params: Option<PaymasterParams>,
}

impl TransferRequest {
    pub fn new(to: Address, amount: U256) -> Self {
        Self {
            to,
            amount,
            token: None,
            paymaster_params: None,
        }
    }

    pub fn token(mut self, token: Address) -> Self {
        self.token = Some(token);
        self
    }

    pub fn paymaster_params(mut self, paymaster_params: PaymasterParams) -> Self {
        self.paymaster_params = Some(paymaster_params);
        self
    }
}

fn paymaster_meta(paymaster_params: Option<PaymasterParams>) -> Option<Eip712Meta> {
    paymaster_params.map(|paymaster_params| Eip712Meta {
        gas_per_pubdata: U256::from(DEFAULT_GAS_PER_PUBDATA_LIMIT),
        paymaster_params: Some(paymaster_params),
        ..Default::default()
    })
}

/// Builds the L2 call that starts a withdrawal.
pub async fn withdraw_request(
    provider: &RollupProvider,
    from: Option<Address>,
    request: WithdrawRequest,
) -> SdkResult<CallRequest> {
    let to = request.to.or(from).ok_or(SdkError::MissingWithdrawalTarget)?;

    let token = if request.token == LEGACY_ETH_ADDRESS {
        provider.l2_token_address(ETH_ADDRESS_IN_CONTRACTS).await?
    } else {
        request.token
    };

    let (target, value, data) = if provider.is_base_token(token).await? {
        if let Some(value) = request.value.filter(|value| *value != request.amount) {
            return Err(SdkError::WithdrawValueMismatch {
                value,
                amount: request.amount,
            });
        }
        let data = IL2BaseToken::withdrawCall { _l1Receiver: to }.abi_encode();
        (L2_BASE_TOKEN_ADDRESS, request.amount, data)
    } else {
        let bridge = match request.bridge_address {
            Some(bridge) => bridge,
            None => provider.l2_shared_bridge_address().await?,
        };
        let data = IL2SharedBridge::withdrawCall {
            _l1Receiver: to,
            _l2Token: token,
            _amount: request.amount,
        }
        .abi_encode();
        (bridge, U256::ZERO, data)
    };
    debug!(%token, %target, %to, amount = %request.amount, "Built withdrawal call");

    Ok(CallRequest {
        from,
        to: Some(target),
        value: Some(value),
        data: Some(Bytes::from(data)),
        eip712_meta: paymaster_meta(request.paymaster_params),
        ..Default::default()
    })
}

/// Builds an L2 transfer. The base token moves as `value`; any other token
/// through its `transfer` function.
pub async fn transfer_request(
    provider: &RollupProvider,
    from: Option<Address>,
    request: TransferRequest,
) -> SdkResult<CallRequest> {
    let token = match request.token {
        Some(token) if token != LEGACY_ETH_ADDRESS && !provider.is_base_token(token).await? => Some(token),
        _ => None,
    };
    Ok(build_transfer(from, token, request))
}

fn build_transfer(from: Option<Address>, erc20: Option<Address>, request: TransferRequest) -> CallRequest {
    let (to, value, data) = match erc20 {
        None => (request.to, request.amount, Bytes::new()),
        Some(token) => {
            let data = IERC20::transferCall {
                to: request.to,
                amount: request.amount,
            }
            .abi_encode();
            (token, U256::ZERO, Bytes::from(data))
        }
    };

    CallRequest {
        from,
        to: Some(to),
        value: Some(value),
        data: Some(data),
        eip712_meta: paymaster_meta(request.paymaster_params),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use zksync_sdk_types::PaymasterInput;

    use super::*;

    #[test]
    fn test_base_token_transfer_uses_value() {
        let to = Address::random();
        let call = build_transfer(None, None, TransferRequest::new(to, U256::from(100)));

        assert_eq!(call.to, Some(to));
        assert_eq!(call.value, Some(U256::from(100)));
        assert_eq!(call.data, Some(Bytes::new()));
        assert!(call.eip712_meta.is_none());
    }

    #[test]
    fn test_erc20_transfer_uses_calldata() -> eyre::Result<()> {
        let to = Address::random();
        let token = Address::random();
        let call = build_transfer(Some(to), Some(token), TransferRequest::new(to, U256::from(5)));

        assert_eq!(call.to, Some(token));
        assert_eq!(call.value, Some(U256::ZERO));
        let decoded = IERC20::transferCall::abi_decode(&call.data.unwrap_or_default())?;
        assert_eq!(decoded.to, to);
        assert_eq!(decoded.amount, U256::from(5));
        Ok(())
    }

    #[test]
    fn test_paymaster_params_attached_unchanged() {
        let params = PaymasterParams::new(
            Address::repeat_byte(0x44),
            PaymasterInput::General {
                inner_input: Bytes::new(),
            },
        );
        let request = TransferRequest::new(Address::random(), U256::from(1)).paymaster_params(params.clone());
        let call = build_transfer(None, None, request);

        let meta = call.eip712_meta.unwrap_or_default();
        assert_eq!(meta.paymaster_params, Some(params));
        assert_eq!(meta.gas_per_pubdata, U256::from(DEFAULT_GAS_PER_PUBDATA_LIMIT));
    }
}
