//! The test scenarios, grouped in suites.

mod failures;
pub use failures::deposit_while_sequencer_down;

mod l1_reorg;
pub use l1_reorg::l1_reorg;

mod p2p_sync;
pub use p2p_sync::p2p_sync;

mod sequencer_startup;
pub use sequencer_startup::{chain_ids, sequencer_startup};

mod withdrawal;
pub use withdrawal::simple_withdrawal;

use crate::{TestSpec, Transport};
use alloy_primitives::TxHash;
use alloy_provider::DynProvider;
use devnet_node::{RollupNode, StartOptions};
use devnet_orchestrator::Devnet;
use devnet_watcher::{wait_for_confirmations, ConfirmationOpts, ProviderReceiptSource, ReceiptFingerprint};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Checks a sequencer devnet comes up and answers over both transports.
pub fn smoke() -> Vec<TestSpec> {
    vec![sequencer_startup(), chain_ids(Transport::Http), chain_ids(Transport::Ws)]
}

/// Checks replicas follow the sequencer over P2P.
pub fn p2p() -> Vec<TestSpec> {
    vec![p2p_sync()]
}

/// Checks the devnet recovers from a sequencer outage.
pub fn failures() -> Vec<TestSpec> {
    vec![deposit_while_sequencer_down()]
}

/// Checks L1 nodes follow reorgs driven through the Engine API.
pub fn reorg() -> Vec<TestSpec> {
    vec![l1_reorg()]
}

/// Checks value deposited to L2 can be withdrawn back to L1.
pub fn withdrawal() -> Vec<TestSpec> {
    vec![simple_withdrawal()]
}

/// Every suite.
pub fn all() -> Vec<TestSpec> {
    [smoke(), p2p(), failures(), reorg(), withdrawal()].into_iter().flatten().collect()
}

/// Starts L2 engine `l2_index` with a replica rollup node on top of it, and peers the replica with
/// the sequencer so it receives unsafe blocks over P2P.
async fn add_peered_replica(devnet: &Devnet, l2_index: usize) -> eyre::Result<Arc<RollupNode>> {
    devnet.add_op_l2(StartOptions::default()).await?;
    devnet.wait_up_op_l2_engine(l2_index, Duration::from_secs(10)).await?;
    let replica = devnet.add_op_node(0, l2_index, false, StartOptions::default()).await?;
    devnet.wait_up_op_node(replica.index(), Duration::from_secs(30)).await?;
    devnet.get_op_node(0).await?.connect_to(&replica).await?;
    info!(target: "devnet::runner", index = replica.index(), peer_id = replica.peer_id(), "replica peered with sequencer");
    Ok(replica)
}

/// Waits until `tx` is buried under `confirmations` blocks of the chain behind `provider`.
async fn confirm(
    provider: &DynProvider,
    tx: TxHash,
    confirmations: u64,
) -> eyre::Result<ReceiptFingerprint> {
    let source = ProviderReceiptSource::new(provider.clone());
    let receipt = wait_for_confirmations(&source, tx, confirmations, ConfirmationOpts::default()).await?;
    eyre::ensure!(receipt.status, "transaction {tx} reverted");
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_runs_every_suite_once() {
        let names = all().into_iter().map(|spec| spec.name).collect::<Vec<_>>();
        let unique = names.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), names.len());
        for suite in [smoke(), p2p(), failures(), reorg(), withdrawal()] {
            for spec in suite {
                assert!(names.contains(&spec.name), "{} missing", spec.name);
            }
        }
        assert!(names.iter().any(|name| name == "simple withdrawal"));
    }
}
