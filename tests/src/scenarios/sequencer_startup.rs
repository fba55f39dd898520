use crate::{TestSpec, Transport};
use alloy_provider::Provider;
use devnet_watcher::{wait_block, wait_synced};
use std::time::Duration;
use tracing::info;

/// Checks the sequencer produces L2 blocks and its engine holds the unsafe head.
pub fn sequencer_startup() -> TestSpec {
    TestSpec::new(
        "sequencer startup",
        "starts a sequencer devnet and waits for both chains to progress",
        Transport::Http,
        |env| async move {
            let devnet = env.devnet();
            devnet.wait_up_op_node(0, Duration::from_secs(30)).await?;
            let sequencer = devnet.get_op_node(0).await?;

            wait_block(env.l2(), 2, Duration::from_secs(60)).await?;
            let head = wait_synced(sequencer.rollup(), env.l2(), Duration::from_secs(60)).await?;
            info!(target: "devnet::runner", unsafe_head = %head.block_info(), "sequencer engine synced");

            let status = sequencer.rollup().sync_status().await?;
            eyre::ensure!(
                status.unsafe_l2.number >= status.safe_l2.number,
                "unsafe head {} behind safe head {}",
                status.unsafe_l2.number,
                status.safe_l2.number
            );
            Ok(())
        },
    )
}

/// Checks both chains report the chain ids of the devnet genesis over `transport`.
pub fn chain_ids(transport: Transport) -> TestSpec {
    TestSpec::new(
        format!("chain ids over {transport:?}"),
        "checks the L1 and L2 chain ids match the genesis configs",
        transport,
        |env| async move {
            let configs = env
                .devnet()
                .chain_configs()
                .await
                .ok_or_else(|| eyre::eyre!("chain not initialized"))?;

            let l1 = env.l1().get_chain_id().await?;
            let l2 = env.l2().get_chain_id().await?;
            eyre::ensure!(l1 == configs.l1.config.chain_id, "unexpected L1 chain id {l1}");
            eyre::ensure!(l2 == configs.l2.config.chain_id, "unexpected L2 chain id {l2}");
            Ok(())
        },
    )
}
