use super::{add_peered_replica, confirm};
use crate::{TestSpec, Transport};
use alloy_network::TransactionBuilder;
use alloy_primitives::U256;
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use devnet_primitives::SequencerDevnetParams;
use devnet_watcher::SyncMonitor;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

const REPLICA_COUNT: usize = 2;
const MAX_REPLICA_LAG: u64 = 5;
const TRAFFIC_DURATION: Duration = Duration::from_secs(60);
const TX_INTERVAL: Duration = Duration::from_millis(100);
const TX_CONFIRMATIONS: u64 = 2;

/// Checks replicas fed by unsafe blocks over P2P stay on the sequencer chain, at most
/// [`MAX_REPLICA_LAG`] blocks behind, while the sequencer includes a steady stream of
/// transactions.
pub fn p2p_sync() -> TestSpec {
    TestSpec::new(
        "p2p sync",
        "runs replicas synced over p2p while the sequencer includes transactions",
        Transport::Http,
        |env| async move {
            let devnet = env.devnet();
            devnet.wait_up_op_node(0, Duration::from_secs(30)).await?;

            let mut replicas = Vec::with_capacity(REPLICA_COUNT);
            for l2_index in 1..=REPLICA_COUNT {
                replicas.push(add_peered_replica(devnet, l2_index).await?);
            }
            let rollups = replicas.iter().map(|replica| replica.rollup().clone()).collect::<Vec<_>>();

            let vault = devnet.l2_vault().await?;
            let sender = vault.create_account(U256::from(10).pow(U256::from(18))).await?;
            let provider = vault.provider_for(sender)?;
            let recipient = devnet.addresses().bob;

            let traffic = async {
                let deadline = Instant::now() + TRAFFIC_DURATION;
                let mut ticker = tokio::time::interval(TX_INTERVAL);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut sent = 0u64;
                let mut last = None;
                while Instant::now() < deadline {
                    ticker.tick().await;
                    let tx = TransactionRequest::default().with_to(recipient).with_value(U256::from(1));
                    match provider.send_transaction(tx).await {
                        Ok(pending) => {
                            sent += 1;
                            last = Some(*pending.tx_hash());
                        }
                        Err(err) => warn!(target: "devnet::runner", %err, "failed to send transaction"),
                    }
                }
                (sent, last)
            };
            let monitor =
                SyncMonitor::new(MAX_REPLICA_LAG).monitor(env.l2(), &rollups, Duration::from_secs(1), TRAFFIC_DURATION);

            let ((sent, last), synced) = tokio::join!(traffic, monitor);
            synced?;
            let last = last.ok_or_else(|| eyre::eyre!("no transaction was sent"))?;
            let included = confirm(env.l2(), last, TX_CONFIRMATIONS).await?;
            info!(target: "devnet::runner", sent, last_block = included.block_number, "replicas stayed in sync");
            Ok(())
        },
    )
    .with_params(SequencerDevnetParams::new(30, 4, 30))
}
