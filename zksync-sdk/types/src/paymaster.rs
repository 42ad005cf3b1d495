use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::contracts::IPaymasterFlow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterParams {
    pub paymaster: Address,
    #[serde(with = "crate::rpc::byte_array")]
    pub paymaster_input: Bytes,
}

/// Input flows understood by the standard paymaster contracts.
#[derive(Debug, Clone)]
pub enum PaymasterInput {
    General {
        inner_input: Bytes,
    },
    ApprovalBased {
        token: Address,
        min_allowance: U256,
        inner_input: Bytes,
    },
}

impl PaymasterParams {
    pub fn new(paymaster: Address, input: PaymasterInput) -> Self {
        let paymaster_input = match input {
            PaymasterInput::General { inner_input } => {
                IPaymasterFlow::generalCall { input: inner_input }.abi_encode()
            }
            PaymasterInput::ApprovalBased {
                token,
                min_allowance,
                inner_input,
            } => IPaymasterFlow::approvalBasedCall {
                _token: token,
                _minAllowance: min_allowance,
                _innerInput: inner_input,
            }
            .abi_encode(),
        };

        Self {
            paymaster,
            paymaster_input: paymaster_input.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_flow_selector() {
        let params = PaymasterParams::new(
            Address::repeat_byte(0x11),
            PaymasterInput::General {
                inner_input: Bytes::new(),
            },
        );
        assert_eq!(params.paymaster_input[..4], IPaymasterFlow::generalCall::SELECTOR);
    }

    #[test]
    fn test_approval_based_flow_encodes_token() {
        let token = Address::repeat_byte(0x22);
        let params = PaymasterParams::new(
            Address::repeat_byte(0x11),
            PaymasterInput::ApprovalBased {
                token,
                min_allowance: U256::from(1),
                inner_input: Bytes::new(),
            },
        );

        let decoded = IPaymasterFlow::approvalBasedCall::abi_decode(&params.paymaster_input).unwrap();
        assert_eq!(decoded._token, token);
        assert_eq!(decoded._minAllowance, U256::from(1));
    }
}
