//! Pure data types of the rollup SDK: the `0x71` transaction envelope and its
//! EIP-712 signing, deposit routing, priority-operation correlation and L2->L1
//! log handling. Nothing in this crate performs I/O.

mod bytecode;
pub use bytecode::*;

mod constants;
pub use constants::*;

mod deposit;
pub use deposit::*;

mod eip712;
pub use eip712::*;

mod envelope;
pub use envelope::*;

mod error;
pub use error::*;

mod l2_to_l1;
pub use l2_to_l1::*;

mod paymaster;
pub use paymaster::*;

mod priority_op;
pub use priority_op::*;

pub mod contracts;
pub mod rpc;

pub type L2TransactionHash = alloy_primitives::B256;
