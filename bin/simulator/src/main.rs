//! Runs the devnet test suites against docker.

use clap::Parser;
use devnet_genesis::DevnetArtifacts;
use devnet_node::{runtime::DockerCli, ClientsByRole};
use std::sync::Arc;
use tests::{clients_from_env, run_tests, DevnetFactory};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod args;
use args::SimulatorArgs;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = SimulatorArgs::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let clients = if args.clients.is_empty() {
        clients_from_env()?
    } else {
        ClientsByRole::from_definitions(args.clients.clone())
    };
    let artifacts = match &args.artifacts {
        Some(dir) => DevnetArtifacts::load(dir)?,
        None => DevnetArtifacts::default(),
    };
    let factory = DevnetFactory::new(Arc::new(DockerCli::new(args.docker.clone())), clients, artifacts);

    let specs = args.suite.tests();
    info!(target: "devnet::runner", suite = ?args.suite, tests = specs.len(), concurrency = args.concurrency, "running suite");
    let report = run_tests(&factory, specs, args.concurrency).await;
    println!("{report}");

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
