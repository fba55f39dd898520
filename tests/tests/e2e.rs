//! Runs the scenarios against docker. Needs the client images of `DEVNET_CLIENTS` and the
//! contract artifacts of `DEVNET_ARTIFACTS`.

use devnet_genesis::DevnetArtifacts;
use devnet_node::runtime::DockerCli;
use std::sync::Arc;
use tests::{clients_from_env, run_tests, scenarios, DevnetFactory, TestSpec};

fn factory() -> eyre::Result<DevnetFactory> {
    let artifacts = match std::env::var("DEVNET_ARTIFACTS") {
        Ok(dir) => DevnetArtifacts::load(dir)?,
        Err(_) => DevnetArtifacts::default(),
    };
    Ok(DevnetFactory::new(Arc::new(DockerCli::default()), clients_from_env()?, artifacts))
}

async fn run(specs: Vec<TestSpec>) -> eyre::Result<()> {
    reth_tracing::init_test_tracing();
    let report = run_tests(&factory()?, specs, 1).await;
    println!("{report}");
    eyre::ensure!(report.is_success(), "{} tests failed", report.failed());
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn can_start_sequencer_devnet() -> eyre::Result<()> {
    run(scenarios::smoke()).await
}

#[tokio::test]
#[ignore = "requires docker"]
async fn can_sync_replicas_over_p2p() -> eyre::Result<()> {
    run(scenarios::p2p()).await
}

#[tokio::test]
#[ignore = "requires docker"]
async fn can_recover_from_sequencer_outage() -> eyre::Result<()> {
    run(scenarios::failures()).await
}

#[tokio::test]
#[ignore = "requires docker"]
async fn can_follow_l1_reorg() -> eyre::Result<()> {
    run(scenarios::reorg()).await
}

#[tokio::test]
#[ignore = "requires docker"]
async fn can_withdraw_to_l1() -> eyre::Result<()> {
    run(scenarios::withdrawal()).await
}
