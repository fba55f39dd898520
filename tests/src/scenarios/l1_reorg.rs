use crate::{TestSpec, Transport};
use alloy_provider::Provider;
use devnet_engine::{build_block, sync_blocks_from, BlockBuildOpts};
use devnet_node::StartOptions;
use std::time::Duration;
use tracing::info;

const BUILDING_TIME: Duration = Duration::from_secs(1);

/// Builds blocks on L1 node 0 through its Engine API, reorging the head once, and replays the
/// result onto L1 node 1.
pub fn l1_reorg() -> TestSpec {
    TestSpec::new(
        "l1 reorg",
        "reorgs the head of an L1 node through the engine api and syncs another node to it",
        Transport::Http,
        |env| async move {
            let devnet = env.devnet();
            devnet.add_eth1(StartOptions::default()).await?;
            devnet.wait_up_eth1(1, Duration::from_secs(10)).await?;
            let source = devnet.get_eth1(0).await?;
            let dest = devnet.get_eth1(1).await?;

            let first = build_block(
                source.engine(),
                BlockBuildOpts { reorg_depth: 0, time_delta: 1, building_time: BUILDING_TIME },
            )
            .await?;
            let reorged = build_block(
                source.engine(),
                BlockBuildOpts { reorg_depth: 1, time_delta: 2, building_time: BUILDING_TIME },
            )
            .await?;
            eyre::ensure!(
                reorged.block_number == first.block_number && reorged.block_hash != first.block_hash,
                "block {} was not replaced",
                first.block_number
            );

            let head = sync_blocks_from(dest.engine(), source.engine()).await?;
            let canonical = dest
                .eth()
                .get_block_by_number(reorged.block_number.into())
                .await?
                .ok_or_else(|| eyre::eyre!("destination at {head} misses block {}", reorged.block_number))?;
            eyre::ensure!(
                canonical.header.hash == reorged.block_hash,
                "destination block {} is {}, expected the reorged block {}",
                reorged.block_number,
                canonical.header.hash,
                reorged.block_hash
            );
            info!(target: "devnet::runner", head = %head, "l1 node followed the reorg");
            Ok(())
        },
    )
}
