use super::{add_peered_replica, confirm};
use crate::{TestSpec, Transport};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider};
use devnet_node::StartOptions;
use devnet_orchestrator::Devnet;
use devnet_primitives::SequencerDevnetParams;
use std::time::Duration;
use tracing::info;

const MINT: u64 = 1_000_000;
const DEPOSIT_GAS_LIMIT: u64 = 1_000_000;
const RECOVERY_TIMEOUT: Duration = Duration::from_secs(120);
const DEPOSIT_CONFIRMATIONS: u64 = 2;

/// Checks a replica keeps deriving deposits from L1 while the sequencer, batcher and proposer are
/// down, and that a restarted sequencer catches up with the replica.
pub fn deposit_while_sequencer_down() -> TestSpec {
    TestSpec::new(
        "deposit while sequencer down",
        "keeps depositing while the sequencer is down and checks it catches up once restarted",
        Transport::Http,
        |mut env| async move {
            let devnet = env.devnet();
            let l1 = env.l1().clone();
            add_peered_replica(devnet, 1).await?;
            let replica_l2 = devnet.get_op_l2_engine(1).await?.eth().clone().erased();

            let depositor = devnet.l1_vault().await?.create_account(U256::from(10).pow(U256::from(18))).await?;
            deposit_and_wait(devnet, &l1, &replica_l2, depositor, 1).await?;

            devnet.shutdown_op_node(0).await?;
            devnet.shutdown_batcher().await?;
            devnet.shutdown_proposer().await?;
            info!(target: "devnet::runner", "sequencer down");

            for expected in 2..=4 {
                deposit_and_wait(devnet, &l1, &replica_l2, depositor, expected).await?;
            }

            let replica_head = block_hash_at(&replica_l2, BlockNumberOrTag::Latest).await?;
            let sequencer_head = block_hash_at(env.l2(), BlockNumberOrTag::Latest).await?;
            eyre::ensure!(
                replica_head.0 != sequencer_head.0,
                "sequencer followed the replica while down, both at block {}",
                replica_head.0
            );

            devnet.add_op_node(0, 0, true, StartOptions::default()).await?;
            devnet.add_op_batcher(0, 0, 2, StartOptions::default()).await?;
            devnet.add_op_proposer(0, 0, 2, StartOptions::default()).await?;
            info!(target: "devnet::runner", "sequencer restarted");

            let l2 = env.l2().clone();
            env.within(RECOVERY_TIMEOUT, async move {
                loop {
                    if l2.get_block_by_hash(replica_head.1).await?.is_some() {
                        return Ok::<_, eyre::Report>(())
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            })
            .await??;
            info!(target: "devnet::runner", number = replica_head.0, hash = %replica_head.1, "sequencer caught up");
            Ok(())
        },
    )
    .with_params(SequencerDevnetParams::new(120, 2, 30))
}

/// Deposits [`MINT`] and waits for the replica to credit it once the deposit is confirmed on L1,
/// `expected` deposits in total.
async fn deposit_and_wait(
    devnet: &Devnet,
    l1: &DynProvider,
    replica: &DynProvider,
    depositor: Address,
    expected: u64,
) -> eyre::Result<()> {
    let receipt = devnet.deposit(0, depositor, U256::from(MINT), DEPOSIT_GAS_LIMIT).await?;
    confirm(l1, receipt.transaction_hash, DEPOSIT_CONFIRMATIONS).await?;
    let target = U256::from(MINT * expected);
    let deadline = tokio::time::Instant::now() + RECOVERY_TIMEOUT;
    loop {
        let balance = replica.get_balance(depositor).await?;
        if balance == target {
            info!(target: "devnet::runner", %depositor, %balance, "deposit credited on replica");
            return Ok(())
        }
        eyre::ensure!(balance < target, "replica balance {balance} exceeds {target}");
        eyre::ensure!(
            tokio::time::Instant::now() < deadline,
            "replica balance stuck at {balance}, expected {target}"
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn block_hash_at(
    provider: &DynProvider,
    tag: BlockNumberOrTag,
) -> eyre::Result<(u64, B256)> {
    let block = provider
        .get_block_by_number(tag)
        .await?
        .ok_or_else(|| eyre::eyre!("missing block {tag}"))?;
    Ok((block.header.number, block.header.hash))
}
