use crate::{deadline::Deadline, SyncDivergence, WaitError, POLL_INTERVAL};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::B256;
use alloy_provider::Provider;
use devnet_node::RollupClient;
use devnet_primitives::L2BlockRef;
use std::time::Duration;
use tracing::{debug, info};

/// Checks that replicas follow the sequencer: every replica head must be part of the sequencer
/// chain and lag its head by at most `max_lag` blocks.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SyncMonitor {
    /// The number of blocks a replica may lag behind.
    pub max_lag: u64,
}

impl SyncMonitor {
    /// The time one round of checks may take.
    pub const ROUND_TIMEOUT: Duration = Duration::from_secs(10);

    /// Returns a new [`SyncMonitor`].
    pub const fn new(max_lag: u64) -> Self {
        Self { max_lag }
    }

    /// Checks the unsafe head of replica `index` against the sequencer, given the sequencer head
    /// and the sequencer block hash at the height of the replica head, if the sequencer has it.
    pub fn check_replica(
        &self,
        index: usize,
        sequencer_head: u64,
        replica_unsafe: &L2BlockRef,
        sequencer_hash_at_height: Option<B256>,
    ) -> Result<(), SyncDivergence> {
        if let Some(expected) = sequencer_hash_at_height {
            if expected != replica_unsafe.hash {
                return Err(SyncDivergence::Diverged {
                    index,
                    number: replica_unsafe.number,
                    expected,
                    actual: replica_unsafe.hash,
                })
            }
        }
        if sequencer_head.saturating_sub(replica_unsafe.number) > self.max_lag {
            return Err(SyncDivergence::TooFarBehind {
                index,
                sequencer_head,
                replica_head: replica_unsafe.number,
            })
        }
        Ok(())
    }

    /// Checks every replica each `interval` for `duration`, failing on the first divergence.
    ///
    /// Every round of checks must complete within [`SyncMonitor::ROUND_TIMEOUT`].
    pub async fn monitor<P: Provider>(
        &self,
        sequencer: &P,
        replicas: &[RollupClient],
        interval: Duration,
        duration: Duration,
    ) -> Result<(), WaitError> {
        let deadline = Deadline::after(duration);
        let mut ticker = tokio::time::interval(interval);
        while !deadline.passed() {
            ticker.tick().await;
            let round = Deadline::after(Self::ROUND_TIMEOUT);
            let timed_out = |what: String| WaitError::timeout(what, round.timeout());
            let sequencer_head = round
                .run(sequencer.get_block_number())
                .await
                .ok_or_else(|| timed_out("sequencer head".to_string()))??;
            for (index, replica) in replicas.iter().enumerate() {
                let status = round
                    .run(replica.sync_status())
                    .await
                    .ok_or_else(|| timed_out(format!("sync status of replica {index}")))??;
                let unsafe_l2 = status.unsafe_l2;
                let expected = round
                    .run(sequencer.get_block_by_number(BlockNumberOrTag::Number(unsafe_l2.number)))
                    .await
                    .ok_or_else(|| timed_out(format!("sequencer block #{}", unsafe_l2.number)))??
                    .map(|block| block.header.hash);
                self.check_replica(index, sequencer_head, &unsafe_l2, expected)?;
                debug!(target: "devnet::watcher", index, sequencer_head, replica_head = unsafe_l2.number, "replica in sync");
            }
        }
        info!(target: "devnet::watcher", replicas = replicas.len(), ?duration, "replicas followed the sequencer");
        Ok(())
    }
}

/// Waits until the unsafe head reported by the rollup node exists in its execution engine.
pub async fn wait_synced<P: Provider>(
    rollup: &RollupClient,
    engine: &P,
    timeout: Duration,
) -> Result<L2BlockRef, WaitError> {
    let deadline = Deadline::after(timeout);
    let timed_out = || WaitError::timeout("engine to hold the unsafe head", timeout);
    loop {
        let unsafe_l2 = deadline.run(rollup.sync_status()).await.ok_or_else(timed_out)??.unsafe_l2;
        if deadline.run(engine.get_block_by_hash(unsafe_l2.hash)).await.ok_or_else(timed_out)??.is_some() {
            return Ok(unsafe_l2)
        }
        if deadline.passed() {
            return Err(WaitError::timeout(
                format!("engine to hold unsafe head #{}", unsafe_l2.number),
                timeout,
            ))
        }
        deadline.sleep(POLL_INTERVAL).await;
    }
}
