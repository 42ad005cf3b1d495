use alloy_primitives::{Address, B256, U256};
use thiserror::Error;
use zksync_sdk_types::{CodecError, Eip712TransactionBuilderError, PriorityOpError};

#[derive(Error, Debug)]
pub enum SdkError {
    // Precondition errors
    #[error("withdrawal target is unknown: neither `to` nor a signer address is available")]
    MissingWithdrawalTarget,
    #[error("value {value} must equal the withdrawn amount {amount} for base token withdrawals")]
    WithdrawValueMismatch { value: U256, amount: U256 },
    #[error("insufficient allowance for {token}: required {required}, actual {actual}")]
    InsufficientAllowance {
        token: Address,
        required: U256,
        actual: U256,
    },
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },
    #[error("{0} bridge is not deployed on this network")]
    BridgeNotFound(&'static str),

    // Network errors
    #[error("{method} failed (params: {params}): {source}")]
    Rpc {
        method: &'static str,
        params: String,
        #[source]
        source: jsonrpsee::core::ClientError,
    },
    #[error("L1 transport error: {0}")]
    L1Transport(String),
    #[error("L1 client is on chain {actual} but the L2 node settles on chain {expected}")]
    L1ChainMismatch { expected: u64, actual: u64 },
    #[error("L1 transaction {0} reverted")]
    L1Reverted(B256),
    #[error("failed to decode {call} return data: {source}")]
    AbiDecode {
        call: &'static str,
        #[source]
        source: alloy_sol_types::Error,
    },

    // Protocol-state errors
    #[error("withdrawal {0} is already finalized")]
    WithdrawalAlreadyFinalized(B256),
    #[error("deposit {0} succeeded and cannot be claimed")]
    CannotClaimSuccessfulDeposit(B256),

    // Already-mined references that lack the expected data
    #[error("transaction {0} is not mined")]
    TransactionNotMined(B256),
    #[error("no L2->L1 log proof for {0}")]
    LogProofNotFound(B256),
    #[error("withdrawal log {index} not found in transaction {hash}")]
    WithdrawalLogNotFound { hash: B256, index: usize },
    #[error(transparent)]
    PriorityOp(#[from] PriorityOpError),

    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    TransactionBuilder(#[from] Eip712TransactionBuilderError),
    #[error("signing failed: {0}")]
    Signer(#[from] alloy_signer::Error),
}

impl SdkError {
    pub(crate) fn rpc<P: std::fmt::Debug>(
        method: &'static str,
        params: P,
    ) -> impl FnOnce(jsonrpsee::core::ClientError) -> Self {
        move |source| Self::Rpc {
            method,
            params: format!("{params:?}"),
            source,
        }
    }

    pub(crate) fn abi_decode(call: &'static str) -> impl FnOnce(alloy_sol_types::Error) -> Self {
        move |source| Self::AbiDecode { call, source }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
