//! Client side of the rollup SDK: an L2 node provider, an L1 client
//! abstraction and the deposit, withdrawal and transfer flows built on them.

pub mod api;
pub mod config;
pub mod correlator;
pub mod deposit;
pub mod error;
pub mod finalizer;
pub mod l1;
pub mod logging;
pub mod provider;
pub mod transaction;
pub mod wallet;
pub mod withdraw;

pub use config::{load_sdk_config, ClientArgs, NetworkConfig, SdkConfig};
pub use correlator::PriorityOpHandle;
pub use deposit::DepositRequest;
pub use error::{SdkError, SdkResult};
pub use l1::{connect_l1_http, AlloyL1Client, L1Client, L1FeeData, L1PendingTransaction};
pub use logging::{init_tracing, LogFormat};
pub use provider::RollupProvider;
pub use transaction::{PendingL2Transaction, PopulatedTransaction};
pub use wallet::{connect_wallet, L1Capable, L2Capable, Wallet};
pub use withdraw::{TransferRequest, WithdrawRequest};
pub use zksync_sdk_types as types;
