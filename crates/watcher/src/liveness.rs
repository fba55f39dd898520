use crate::{deadline::Deadline, WaitError};
use alloy_primitives::TxHash;
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionReceipt;
use devnet_node::RollupClient;
use std::time::Duration;
use tracing::{debug, info};

/// The interval the liveness waiters poll at.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Waits until the node behind `provider` answers `eth_chainId` and returns the chain id.
///
/// Connection errors are expected while the node starts and are retried until `timeout`. A node
/// that accepts connections but never answers is given up on at the same deadline.
pub async fn wait_up<P: Provider>(provider: &P, timeout: Duration) -> Result<u64, WaitError> {
    let deadline = Deadline::after(timeout);
    loop {
        match deadline.run(provider.get_chain_id()).await {
            Some(Ok(chain_id)) => return Ok(chain_id),
            Some(Err(err)) => debug!(target: "devnet::watcher", %err, "node not up yet"),
            None => debug!(target: "devnet::watcher", "node did not answer"),
        }
        if deadline.passed() {
            return Err(WaitError::timeout("node to come up", timeout))
        }
        deadline.sleep(POLL_INTERVAL).await;
    }
}

/// Waits until the rollup node answers `optimism_syncStatus`.
pub async fn wait_rollup_up(rollup: &RollupClient, timeout: Duration) -> Result<(), WaitError> {
    let deadline = Deadline::after(timeout);
    loop {
        match deadline.run(rollup.sync_status()).await {
            Some(Ok(_)) => return Ok(()),
            Some(Err(err)) => debug!(target: "devnet::watcher", %err, "rollup node not up yet"),
            None => debug!(target: "devnet::watcher", "rollup node did not answer"),
        }
        if deadline.passed() {
            return Err(WaitError::timeout("rollup node to come up", timeout))
        }
        deadline.sleep(POLL_INTERVAL).await;
    }
}

/// Waits until the chain behind `provider` reaches block `number` and returns the head.
pub async fn wait_block<P: Provider>(
    provider: &P,
    number: u64,
    timeout: Duration,
) -> Result<u64, WaitError> {
    let deadline = Deadline::after(timeout);
    let mut last = None;
    loop {
        let head = deadline
            .run(provider.get_block_number())
            .await
            .ok_or_else(|| WaitError::timeout(format!("block #{number}"), timeout))??;
        if head >= number {
            return Ok(head)
        }
        if last != Some(head) {
            info!(target: "devnet::watcher", head, target_block = number, "waiting for block");
            last = Some(head);
        }
        if deadline.passed() {
            return Err(WaitError::timeout(format!("block #{number}, head at #{head}"), timeout))
        }
        deadline.sleep(POLL_INTERVAL).await;
    }
}

/// Waits for the receipt of `tx`.
pub async fn wait_receipt<P: Provider>(
    provider: &P,
    tx: TxHash,
    timeout: Duration,
) -> Result<TransactionReceipt, WaitError> {
    let deadline = Deadline::after(timeout);
    loop {
        let receipt = deadline
            .run(provider.get_transaction_receipt(tx))
            .await
            .ok_or_else(|| WaitError::timeout(format!("receipt of {tx}"), timeout))??;
        if let Some(receipt) = receipt {
            debug!(target: "devnet::watcher", %tx, block = ?receipt.block_number, "found receipt");
            return Ok(receipt)
        }
        if deadline.passed() {
            return Err(WaitError::timeout(format!("receipt of {tx}"), timeout))
        }
        deadline.sleep(POLL_INTERVAL).await;
    }
}
