mod common;

use std::time::Duration;

use alloy_primitives::{B256, U64};
use common::*;
use tokio::time::timeout;
use zksync_sdk::PendingL2Transaction;
use zksync_sdk_types::rpc::L2TransactionReceipt;

const SHORT_WAIT: Duration = Duration::from_millis(100);

#[tokio::test]
async fn test_wait_requires_block_and_confirmations() -> eyre::Result<()> {
    let state = eth_based_state();
    let node = MockL2Node::start(state.clone()).await?;
    let provider = node.provider()?;
    let tx_hash = B256::repeat_byte(0x5e);

    lock(&state).l2_receipts.insert(
        tx_hash,
        L2TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: None,
            ..Default::default()
        },
    );
    let pending = PendingL2Transaction::new(&provider, tx_hash);

    // A receipt without a block is still pending.
    assert!(timeout(SHORT_WAIT, pending.wait(1)).await.is_err());

    let mined_at = {
        let mut state = lock(&state);
        let head = state.block_number;
        if let Some(receipt) = state.l2_receipts.get_mut(&tx_hash) {
            receipt.block_number = Some(U64::from(head));
        }
        head
    };
    assert_eq!(timeout(SHORT_WAIT, pending.wait(1)).await??.transaction_hash, tx_hash);

    // Mined at the head: one confirmation, two short of three.
    assert!(timeout(SHORT_WAIT, pending.wait(3)).await.is_err());
    lock(&state).block_number += 1;
    assert!(timeout(SHORT_WAIT, pending.wait(3)).await.is_err());

    lock(&state).block_number += 1;
    let receipt = timeout(Duration::from_secs(5), pending.wait(3)).await??;
    assert_eq!(receipt.block_number, Some(U64::from(mined_at)));
    Ok(())
}
