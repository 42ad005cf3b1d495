use alloy_primitives::B256;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("transaction is not signed")]
    NotSigned,
    #[error("empty custom signatures are not supported")]
    EmptyCustomSignature,
    #[error("invalid tx_bytes length")]
    InvalidLength,
    #[error("unexpected transaction type {0:#04x}")]
    UnexpectedTxType(u8),
    #[error("rlp decode failed: {0}")]
    RlpDecodeFailed(#[from] alloy_rlp::Error),
    #[error("standard transaction decode failed: {0}")]
    StandardDecodeFailed(#[from] alloy_eips::eip2718::Eip2718Error),
    #[error("invalid {field_name}: {reason}")]
    InvalidField {
        field_name: &'static str,
        reason: &'static str,
    },
    #[error("factory dependency {index} is invalid: {err}")]
    InvalidFactoryDep { index: usize, err: BytecodeError },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("bytecode length in bytes must be divisible by 32")]
    NotWordAligned,
    #[error("bytecode length in words must be odd")]
    EvenWordCount,
    #[error("bytecode length is too big: {0} words")]
    TooLong(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum PriorityOpError {
    #[error("failed to find a priority operation log emitted by {0}")]
    NotFound(alloy_primitives::Address),
    #[error("transaction {0} emitted no bootloader log for the deposit")]
    MissingBootloaderLog(B256),
}
