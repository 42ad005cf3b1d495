use alloy_primitives::{Address, B256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;

use crate::{contracts::IZkSyncMainContract::NewPriorityRequest, error::PriorityOpError};

/// Derives the L2 hash of the priority operation enqueued by an L1
/// transaction from that transaction's receipt logs.
///
/// Only logs emitted by `main_contract` are considered; the last one that
/// decodes as `NewPriorityRequest` wins.
pub fn l2_hash_from_priority_op(logs: &[Log], main_contract: Address) -> Result<B256, PriorityOpError> {
    logs.iter()
        .filter(|log| log.address() == main_contract)
        .filter_map(|log| NewPriorityRequest::decode_log_data(log.data()).ok())
        .last()
        .map(|request| request.txHash)
        .ok_or(PriorityOpError::NotFound(main_contract))
}
