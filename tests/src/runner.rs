use crate::RunnerMetrics;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use devnet_genesis::DevnetArtifacts;
use devnet_node::{ClientsByRole, ContainerRuntime};
use devnet_orchestrator::{Devnet, DevnetConfig, DevnetError};
use devnet_primitives::SequencerDevnetParams;
use futures::future::BoxFuture;
use std::{
    fmt,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

type SetupFn = Arc<dyn Fn(Arc<Devnet>) -> BoxFuture<'static, Result<(), DevnetError>> + Send + Sync>;
type TestFn = Arc<dyn Fn(TestEnv) -> BoxFuture<'static, eyre::Result<()>> + Send + Sync>;

/// The transport of the RPC clients handed to a test.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Transport {
    /// JSON-RPC over HTTP.
    #[default]
    Http,
    /// JSON-RPC over a websocket.
    Ws,
}

/// A test: a name, the devnet it needs and the body to run against it.
#[derive(Clone)]
pub struct TestSpec {
    /// The name of the test.
    pub name: String,
    /// What the test checks.
    pub description: String,
    /// The transport of the test clients.
    pub transport: Transport,
    setup: SetupFn,
    run: TestFn,
}

impl fmt::Debug for TestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl TestSpec {
    /// Returns a test running `run` against a sequencer devnet with the default parameters.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        transport: Transport,
        run: F,
    ) -> Self
    where
        F: Fn(TestEnv) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = eyre::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            transport,
            setup: sequencer_setup(SequencerDevnetParams::default()),
            run: Arc::new(move |env| Box::pin(run(env))),
        }
    }

    /// Starts the sequencer devnet of the test with `params`.
    pub fn with_params(mut self, params: SequencerDevnetParams) -> Self {
        self.setup = sequencer_setup(params);
        self
    }

    /// Replaces the devnet setup of the test. The setup must at least start L1 node 0 and L2
    /// engine 0, the test clients connect to them.
    pub fn with_setup<F, Fut>(mut self, setup: F) -> Self
    where
        F: Fn(Arc<Devnet>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DevnetError>> + Send + 'static,
    {
        self.setup = Arc::new(move |devnet| Box::pin(setup(devnet)));
        self
    }
}

fn sequencer_setup(params: SequencerDevnetParams) -> SetupFn {
    Arc::new(move |devnet| {
        let params = params.clone();
        Box::pin(async move { devnet.start_sequencer_devnet(params).await })
    })
}

/// Everything a running test gets: its devnet and clients of L1 node 0 and L2 engine 0.
///
/// Dropping the environment cancels every context derived from it.
pub struct TestEnv {
    devnet: Arc<Devnet>,
    transport: Transport,
    l1: DynProvider,
    l2: DynProvider,
    cancel: CancellationToken,
    last_ctx: Option<CancellationToken>,
}

impl fmt::Debug for TestEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEnv")
            .field("devnet", &self.devnet)
            .field("transport", &self.transport)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl TestEnv {
    /// Connects the test clients to the devnet.
    pub async fn new(devnet: Arc<Devnet>, transport: Transport) -> Result<Self, DevnetError> {
        let l1 = devnet.get_eth1(0).await?;
        let l2 = devnet.get_op_l2_engine(0).await?;
        let (l1, l2) = match transport {
            Transport::Http => (l1.http_url()?, l2.http_url()?),
            Transport::Ws => (l1.ws_url()?, l2.ws_url()?),
        };
        Ok(Self {
            devnet,
            transport,
            l1: ProviderBuilder::new().connect(l1.as_str()).await?.erased(),
            l2: ProviderBuilder::new().connect(l2.as_str()).await?.erased(),
            cancel: CancellationToken::new(),
            last_ctx: None,
        })
    }

    /// Returns the devnet of the test.
    pub fn devnet(&self) -> &Devnet {
        &self.devnet
    }

    /// Returns the transport of the test clients.
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Returns a client of L1 node 0.
    pub const fn l1(&self) -> &DynProvider {
        &self.l1
    }

    /// Returns a client of L2 engine 0.
    pub const fn l2(&self) -> &DynProvider {
        &self.l2
    }

    /// Returns a context cancelled after `timeout`, or when the environment is dropped.
    ///
    /// Only the latest context is live: asking for a new one cancels the previous one.
    pub fn ctx(&mut self, timeout: Duration) -> CancellationToken {
        if let Some(previous) = self.last_ctx.take() {
            previous.cancel();
        }
        let ctx = self.cancel.child_token();
        let timer = ctx.clone();
        tokio::spawn(async move {
            timer.run_until_cancelled(tokio::time::sleep(timeout)).await;
            timer.cancel();
        });
        self.last_ctx = Some(ctx.clone());
        ctx
    }

    /// Runs `fut` until it completes or `timeout` passes.
    pub async fn within<F: Future>(&mut self, timeout: Duration, fut: F) -> eyre::Result<F::Output> {
        self.ctx(timeout)
            .run_until_cancelled(fut)
            .await
            .ok_or_else(|| eyre::eyre!("timed out after {timeout:?}"))
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Creates a fresh devnet for every test.
#[derive(Debug, Clone)]
pub struct DevnetFactory {
    runtime: Arc<dyn ContainerRuntime>,
    clients: ClientsByRole,
    artifacts: DevnetArtifacts,
}

impl DevnetFactory {
    /// Returns a factory of devnets running `clients` on `runtime`.
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        clients: ClientsByRole,
        artifacts: DevnetArtifacts,
    ) -> Self {
        Self { runtime, clients, artifacts }
    }

    /// Returns a new devnet, with nothing started.
    pub fn create(&self) -> Result<Devnet, DevnetError> {
        let config = DevnetConfig { artifacts: self.artifacts.clone(), ..Default::default() };
        Devnet::new(self.runtime.clone(), self.clients.clone(), config)
    }
}

/// The outcome of one test.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// The name of the test.
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// How long the test took, devnet setup and teardown included.
    pub duration: Duration,
    /// Why the test failed.
    pub error: Option<String>,
}

/// The outcomes of a test run, in the order the tests were given.
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    /// The outcome of every test.
    pub outcomes: Vec<TestOutcome>,
}

impl TestReport {
    /// Returns the number of passed tests.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.passed).count()
    }

    /// Returns the number of failed tests.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Returns true if every test passed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            let status = if outcome.passed { "PASS" } else { "FAIL" };
            write!(f, "{status} {} ({:.1?})", outcome.name, outcome.duration)?;
            if let Some(error) = &outcome.error {
                write!(f, ": {error}")?;
            }
            writeln!(f)?;
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}

/// Runs the tests, at most `concurrency` at a time, each against a devnet of its own.
///
/// A failing or panicking test does not affect the others. The devnet of a test is shut down once
/// it completes, whatever the outcome.
pub async fn run_tests(devnets: &DevnetFactory, specs: Vec<TestSpec>, concurrency: usize) -> TestReport {
    let metrics = RunnerMetrics::default();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (position, spec) in specs.into_iter().enumerate() {
        let permits = permits.clone();
        let devnets = devnets.clone();
        let metrics = metrics.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let outcome = run_test(&devnets, spec).await;
            if outcome.passed {
                metrics.passed.increment(1);
            } else {
                metrics.failed.increment(1);
            }
            metrics.test_duration.record(outcome.duration.as_secs_f64());
            (position, outcome)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => error!(target: "devnet::runner", %err, "test task failed"),
        }
    }
    outcomes.sort_by_key(|(position, _)| *position);
    TestReport { outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect() }
}

async fn run_test(devnets: &DevnetFactory, spec: TestSpec) -> TestOutcome {
    let start = Instant::now();
    info!(target: "devnet::runner", name = %spec.name, description = %spec.description, "starting test");

    let result = match devnets.create() {
        Ok(devnet) => {
            let devnet = Arc::new(devnet);
            let result = run_isolated(devnet.clone(), &spec).await;
            if let Err(err) = devnet.shutdown_all().await {
                warn!(target: "devnet::runner", name = %spec.name, %err, "failed to shut down devnet");
            }
            result
        }
        Err(err) => Err(format!("failed to create devnet: {err}")),
    };

    let duration = start.elapsed();
    match &result {
        Ok(()) => info!(target: "devnet::runner", name = %spec.name, ?duration, "test passed"),
        Err(err) => error!(target: "devnet::runner", name = %spec.name, ?duration, %err, "test failed"),
    }
    TestOutcome { name: spec.name, passed: result.is_ok(), duration, error: result.err() }
}

/// Runs the setup and the body of the test in a task of their own, turning a panic into a failure.
async fn run_isolated(devnet: Arc<Devnet>, spec: &TestSpec) -> Result<(), String> {
    let setup = spec.setup.clone();
    let run = spec.run.clone();
    let transport = spec.transport;
    let task = tokio::spawn(async move {
        setup(devnet.clone()).await.map_err(|err| format!("setup failed: {err}"))?;
        let env = TestEnv::new(devnet, transport).await.map_err(|err| format!("{err}"))?;
        run(env).await.map_err(|err| format!("{err:#}"))
    });
    match task.await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(format!("panicked: {}", panic_message(err.into_panic()))),
        Err(err) => Err(err.to_string()),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_node::{ClientDefinition, MockRuntime, RuntimeEvent, StartOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn factory(runtime: Arc<MockRuntime>) -> DevnetFactory {
        let clients = ClientsByRole::from_definitions(
            ["geth=geth:eth1", "op-geth=op-geth:op-l2"]
                .iter()
                .map(|def| def.parse::<ClientDefinition>().unwrap())
                .collect::<Vec<_>>(),
        );
        DevnetFactory::new(runtime, clients, DevnetArtifacts::default())
    }

    async fn mock_setup(devnet: Arc<Devnet>) -> Result<(), DevnetError> {
        devnet.init_chain(SequencerDevnetParams::default()).await?;
        devnet.add_eth1(StartOptions::default()).await?;
        devnet.add_op_l2(StartOptions::default()).await?;
        Ok(())
    }

    async fn pass(_env: TestEnv) -> eyre::Result<()> {
        Ok(())
    }

    async fn fail(_env: TestEnv) -> eyre::Result<()> {
        Err(eyre::eyre!("boom"))
    }

    async fn explode(_env: TestEnv) -> eyre::Result<()> {
        panic!("kaboom")
    }

    fn spec<F, Fut>(name: &str, run: F) -> TestSpec
    where
        F: Fn(TestEnv) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = eyre::Result<()>> + Send + 'static,
    {
        TestSpec::new(name, "", Transport::Http, run).with_setup(mock_setup)
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        reth_tracing::init_test_tracing();
        let runtime = Arc::new(MockRuntime::new());
        let specs = vec![
            spec("ok", pass),
            spec("error", fail),
            spec("panic", explode),
            spec("ok again", pass),
        ];

        let report = run_tests(&factory(runtime), specs, 2).await;

        let names = report.outcomes.iter().map(|o| o.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["ok", "error", "panic", "ok again"]);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_success());
        assert_eq!(report.outcomes[1].error.as_deref(), Some("boom"));
        assert!(report.outcomes[2].error.as_ref().unwrap().contains("kaboom"));
    }

    #[tokio::test]
    async fn test_every_devnet_is_shut_down() {
        reth_tracing::init_test_tracing();
        let runtime = Arc::new(MockRuntime::new());
        let specs = (0..3).map(|i| spec(&format!("test {i}"), pass)).collect();

        let report = run_tests(&factory(runtime.clone()), specs, 3).await;
        assert!(report.is_success());

        let events = runtime.events();
        let created = events.iter().filter(|e| matches!(e, RuntimeEvent::NetworkCreated(_))).count();
        let removed = events.iter().filter(|e| matches!(e, RuntimeEvent::NetworkRemoved(_))).count();
        assert_eq!(created, 3);
        assert_eq!(removed, 3);
        // two containers per devnet.
        assert_eq!(events.iter().filter(|e| matches!(e, RuntimeEvent::Removed(_))).count(), 6);
    }

    #[tokio::test]
    async fn test_setup_failure_fails_the_test() {
        reth_tracing::init_test_tracing();
        let runtime = Arc::new(MockRuntime::new());
        runtime.fail_image("op-geth");
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let spec = TestSpec::new("setup", "", Transport::Http, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .with_setup(mock_setup);

        let report = run_tests(&factory(runtime), vec![spec], 1).await;

        assert_eq!(report.failed(), 1);
        assert!(report.outcomes[0].error.as_ref().unwrap().starts_with("setup failed"));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        reth_tracing::init_test_tracing();
        let runtime = Arc::new(MockRuntime::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let specs = (0..6)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                TestSpec::new(format!("test {i}"), "", Transport::Http, move |_| {
                    let running = running.clone();
                    let peak = peak.clone();
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .with_setup(mock_setup)
            })
            .collect();

        let report = run_tests(&factory(runtime), specs, 2).await;

        assert!(report.is_success());
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_new_context_cancels_previous() {
        reth_tracing::init_test_tracing();
        let runtime = Arc::new(MockRuntime::new());
        let devnet = Arc::new(factory(runtime).create().unwrap());
        mock_setup(devnet.clone()).await.unwrap();
        let mut env = TestEnv::new(devnet, Transport::Http).await.unwrap();

        let first = env.ctx(Duration::from_secs(60));
        assert!(!first.is_cancelled());
        let second = env.ctx(Duration::from_millis(10));
        assert!(first.is_cancelled());
        second.cancelled().await;

        let third = env.ctx(Duration::from_secs(60));
        drop(env);
        assert!(third.is_cancelled());
    }

    #[tokio::test]
    async fn test_within_times_out() {
        reth_tracing::init_test_tracing();
        let runtime = Arc::new(MockRuntime::new());
        let devnet = Arc::new(factory(runtime).create().unwrap());
        mock_setup(devnet.clone()).await.unwrap();
        let mut env = TestEnv::new(devnet, Transport::Http).await.unwrap();

        let value = env.within(Duration::from_secs(5), async { 7 }).await.unwrap();
        assert_eq!(value, 7);
        let err = env.within(Duration::from_millis(10), std::future::pending::<()>()).await;
        assert!(err.is_err());
    }

    #[test]
    fn test_report_display() {
        let report = TestReport {
            outcomes: vec![
                TestOutcome { name: "a".into(), passed: true, duration: Duration::from_secs(1), error: None },
                TestOutcome {
                    name: "b".into(),
                    passed: false,
                    duration: Duration::from_secs(2),
                    error: Some("boom".into()),
                },
            ],
        };
        let out = report.to_string();
        assert!(out.contains("PASS a"));
        assert!(out.contains("FAIL b"));
        assert!(out.contains(": boom"));
        assert!(out.ends_with("1 passed, 1 failed"));
    }
}
