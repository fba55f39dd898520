use crate::{
    contracts::{L2OutputOracle, L2ToL1MessagePasser, L2_TO_L1_MESSAGE_PASSER},
    env::{batcher_options, eth1_options, merge, op_node_options, proposer_options},
    withdrawal::{encode_withdrawal_proof, next_output_block, withdrawal_from_logs},
    BatcherConfig, DevnetError, OptimismPortal, OutputRootProof, ProposerConfig, Vault,
};
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{hex, Address, Bytes, TxHash, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_engine::JwtSecret;
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionReceipt, TransactionRequest};
use alloy_sol_types::SolCall;
use devnet_engine::EngineKind;
use devnet_genesis::{ChainConfigs, DeployConfig, DevnetArtifacts};
use devnet_node::{
    BatcherNode, ClientsByRole, ContainerId, ContainerRuntime, ExecutionNode, L1Node, L2Engine,
    NetworkId, ProposerNode, Role, RollupNode, StartOptions,
};
use devnet_primitives::{
    constants::{GENESIS_PATH, JWT_SECRET_PATH, P2P_PRIV_KEY_PATH, ROLLUP_CONFIG_PATH},
    SequencerDevnetParams,
};
use devnet_signer::{encode_private_key, Addresses, MnemonicConfig, Secrets};
use devnet_watcher::{wait_block, wait_receipt, wait_rollup_up, wait_up, WaitError};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How long a deposit may take to be included on L1.
const DEPOSIT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a withdrawal transaction may take to be included, on either chain.
const WITHDRAWAL_TIMEOUT: Duration = Duration::from_secs(60);

/// The interval the L2 output oracle and the L1 head are polled at while a withdrawal matures.
const FINALIZATION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Used to give every devnet of the process its own network.
static DEVNET_COUNT: AtomicU64 = AtomicU64::new(0);

/// Settings of a [`Devnet`].
#[derive(Debug, Clone)]
pub struct DevnetConfig {
    /// The name of the devnet network. Every devnet of the process gets its own name when unset.
    pub name: Option<String>,
    /// The key material of the devnet.
    pub mnemonic: MnemonicConfig,
    /// The contract allocations and deployments.
    pub artifacts: DevnetArtifacts,
    /// The batch submitter settings.
    pub batcher: BatcherConfig,
    /// The output proposer settings.
    pub proposer: ProposerConfig,
    /// The L1 block time.
    pub l1_block_time: u64,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            name: None,
            mnemonic: MnemonicConfig::default(),
            artifacts: DevnetArtifacts::default(),
            batcher: BatcherConfig::default(),
            proposer: ProposerConfig::default(),
            l1_block_time: 15,
        }
    }
}

#[derive(Debug, Default)]
struct DevnetState {
    configs: Option<Arc<ChainConfigs>>,
    network: Option<NetworkId>,
    containers: Vec<ContainerId>,
    eth1s: Vec<Arc<L1Node>>,
    l2_engines: Vec<Arc<L2Engine>>,
    op_nodes: Vec<Arc<RollupNode>>,
    stopped_op_nodes: HashSet<usize>,
    proposer: Option<Arc<ProposerNode>>,
    batcher: Option<Arc<BatcherNode>>,
    l1_vault: Option<Arc<Vault>>,
    l2_vault: Option<Arc<Vault>>,
}

fn get<T>(nodes: &[Arc<T>], role: Role, index: usize) -> Result<Arc<T>, DevnetError> {
    nodes.get(index).cloned().ok_or(DevnetError::IndexOutOfRange { role, index, len: nodes.len() })
}

impl DevnetState {
    fn configs(&self) -> Result<Arc<ChainConfigs>, DevnetError> {
        self.configs.clone().ok_or(DevnetError::ChainNotInitialized)
    }

    fn sequencer_running(&self) -> bool {
        self.op_nodes
            .iter()
            .any(|node| node.is_sequencer() && !self.stopped_op_nodes.contains(&node.index()))
    }
}

/// An OP-stack devnet: L1 nodes, L2 engines, rollup nodes, a proposer and a batcher running in
/// containers of one network.
///
/// Every mutation goes through one lock, held across container starts, and validates its
/// prerequisites before anything is started. A failed operation leaves the node lists untouched.
#[derive(Debug)]
pub struct Devnet {
    runtime: Arc<dyn ContainerRuntime>,
    clients: ClientsByRole,
    name: String,
    config: DevnetConfig,
    secrets: Secrets,
    addresses: Addresses,
    jwt: JwtSecret,
    state: Mutex<DevnetState>,
}

impl Devnet {
    /// Returns a new devnet running `clients` on `runtime`.
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        clients: ClientsByRole,
        config: DevnetConfig,
    ) -> Result<Self, DevnetError> {
        let secrets = config.mnemonic.secrets()?;
        let addresses = secrets.addresses();
        let name = config.name.clone().unwrap_or_else(|| {
            let count = DEVNET_COUNT.fetch_add(1, Ordering::Relaxed);
            format!("devnet-{}-{count}", std::process::id())
        });
        Ok(Self {
            runtime,
            clients,
            name,
            config,
            secrets,
            addresses,
            jwt: JwtSecret::random(),
            state: Default::default(),
        })
    }

    /// Returns the name of the devnet network.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the secrets of the devnet roles.
    pub const fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    /// Returns the addresses of the devnet roles.
    pub const fn addresses(&self) -> &Addresses {
        &self.addresses
    }

    /// Returns the contract deployments.
    pub const fn deployments(&self) -> &devnet_genesis::Deployments {
        &self.config.artifacts.deployments
    }

    /// Returns the chain configuration, once created.
    pub async fn chain_configs(&self) -> Option<Arc<ChainConfigs>> {
        self.state.lock().await.configs.clone()
    }

    /// Creates the L1 genesis, the L2 genesis and the rollup config. Can only be done once.
    pub async fn init_chain(&self, params: SequencerDevnetParams) -> Result<(), DevnetError> {
        let mut state = self.state.lock().await;
        if state.configs.is_some() {
            return Err(DevnetError::ChainAlreadyInitialized)
        }

        let timestamp =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
        let deploy_config = DeployConfig::new(&params, &self.addresses, timestamp)
            .with_l1_block_time(self.config.l1_block_time);
        let configs = ChainConfigs::build(
            &deploy_config,
            &self.config.artifacts,
            params.additional_genesis_allocs,
        )?;

        info!(target: "devnet::orchestrator", name = %self.name, "created genesis files");
        state.configs = Some(Arc::new(configs));
        Ok(())
    }

    fn client(&self, role: Role) -> Result<&devnet_node::ClientDefinition, DevnetError> {
        self.clients.first(role).ok_or(DevnetError::MissingClientType(role))
    }

    fn jwt_file(&self) -> StartOptions {
        StartOptions::default().with_file(JWT_SECRET_PATH, hex::encode(self.jwt.as_bytes()))
    }

    /// Starts a container of `image`, creating the devnet network on first use.
    async fn launch(
        &self,
        state: &mut DevnetState,
        image: &str,
        options: StartOptions,
    ) -> Result<devnet_node::ContainerInfo, DevnetError> {
        let network = match &state.network {
            Some(network) => network.clone(),
            None => {
                let network = self.runtime.create_network(&self.name).await?;
                state.network = Some(network.clone());
                network
            }
        };
        let info = self.runtime.launch(image, &network, &options).await?;
        state.containers.push(info.id.clone());
        Ok(info)
    }

    /// Adds an L1 node. The first node signs blocks, later ones use it as bootnode.
    pub async fn add_eth1(&self, opts: StartOptions) -> Result<Arc<L1Node>, DevnetError> {
        let mut state = self.state.lock().await;
        let client = self.client(Role::Eth1)?;
        let configs = state.configs()?;

        let mut options = eth1_options(&configs.l1)
            .with_file(GENESIS_PATH, serde_json::to_vec(&configs.l1)?);
        options = merge(options, self.jwt_file());
        options = match state.eth1s.first() {
            None => options
                .with_env("HIVE_CLIQUE_PRIVATEKEY", encode_private_key(&self.secrets.clique_signer))
                .with_env("HIVE_MINER", self.addresses.clique_signer),
            Some(bootnode) => options.with_env("HIVE_BOOTNODE", bootnode.enode().await?),
        };
        let options = merge(options, opts);

        let info = self.launch(&mut state, &client.image, options).await?;
        let node = Arc::new(ExecutionNode::new(info, &client.name, EngineKind::L1, self.jwt.clone())?);
        info!(target: "devnet::orchestrator", index = state.eth1s.len(), client = %client.name, ip = %node.container().ip, "added eth1 node");
        state.eth1s.push(node.clone());
        Ok(node)
    }

    /// Adds an L2 execution engine.
    pub async fn add_op_l2(&self, opts: StartOptions) -> Result<Arc<L2Engine>, DevnetError> {
        let mut state = self.state.lock().await;
        let client = self.client(Role::OpL2)?;
        let configs = state.configs()?;

        let options = StartOptions::default()
            .with_env("HIVE_ETH1_LOGLEVEL", 3)
            .with_file(GENESIS_PATH, serde_json::to_vec(&configs.l2)?);
        let options = merge(merge(options, self.jwt_file()), opts);

        let info = self.launch(&mut state, &client.image, options).await?;
        let node = Arc::new(ExecutionNode::new(info, &client.name, EngineKind::L2, self.jwt.clone())?);
        info!(target: "devnet::orchestrator", index = state.l2_engines.len(), client = %client.name, ip = %node.container().ip, "added op-l2 engine");
        state.l2_engines.push(node.clone());
        Ok(node)
    }

    /// Adds a rollup node following L1 node `l1_index` and driving L2 engine `l2_index`.
    ///
    /// Only one live rollup node may sequence. A new sequencer can be added once the previous one
    /// was shut down.
    pub async fn add_op_node(
        &self,
        l1_index: usize,
        l2_index: usize,
        sequencer: bool,
        opts: StartOptions,
    ) -> Result<Arc<RollupNode>, DevnetError> {
        let mut state = self.state.lock().await;
        let client = self.client(Role::OpNode)?;
        let configs = state.configs()?;
        let eth1 = get(&state.eth1s, Role::Eth1, l1_index)?;
        let l2 = get(&state.l2_engines, Role::OpL2, l2_index)?;
        if sequencer && state.sequencer_running() {
            return Err(DevnetError::SequencerAlreadyRunning)
        }

        let index = state.op_nodes.len();
        let p2p_key = self.config.mnemonic.p2p_key_for(index as u32)?;

        let mut options = op_node_options(&eth1.ws_url()?, &l2.engine_url()?, sequencer)
            .with_file(ROLLUP_CONFIG_PATH, serde_json::to_vec(&configs.rollup)?)
            .with_file(P2P_PRIV_KEY_PATH, encode_private_key(&p2p_key));
        if sequencer {
            options = options
                .with_env("OP_NODE_P2P_SEQUENCER_KEY", encode_private_key(&self.secrets.sequencer_p2p));
        }
        let options = merge(merge(options, self.jwt_file()), opts);

        let info = self.launch(&mut state, &client.image, options).await?;
        let node = Arc::new(RollupNode::new(info, index, sequencer, &p2p_key)?);
        info!(target: "devnet::orchestrator", index, sequencer, ip = %node.container().ip, peer_id = node.peer_id(), "added op-node");
        state.op_nodes.push(node.clone());
        Ok(node)
    }

    /// Adds the output proposer, reading outputs from rollup node `op_node_index`.
    pub async fn add_op_proposer(
        &self,
        l1_index: usize,
        l2_index: usize,
        op_node_index: usize,
        opts: StartOptions,
    ) -> Result<Arc<ProposerNode>, DevnetError> {
        let mut state = self.state.lock().await;
        let client = self.client(Role::OpProposer)?;
        state.configs()?;
        if state.proposer.is_some() {
            return Err(DevnetError::AlreadyRunning(Role::OpProposer))
        }
        let eth1 = get(&state.eth1s, Role::Eth1, l1_index)?;
        get(&state.l2_engines, Role::OpL2, l2_index)?;
        let op_node = get(&state.op_nodes, Role::OpNode, op_node_index)?;

        let options = proposer_options(
            &self.config.proposer,
            &eth1.ws_url()?,
            &op_node.rpc_url()?,
            self.config.artifacts.deployments.l2_output_oracle_proxy,
            &self.config.mnemonic.mnemonic,
            &self.config.mnemonic.proposer_path,
        );
        let options = merge(options, opts);

        let info = self.launch(&mut state, &client.image, options).await?;
        info!(target: "devnet::orchestrator", ip = %info.ip, "added op-proposer");
        let proposer = Arc::new(ProposerNode { container: info });
        state.proposer = Some(proposer.clone());
        Ok(proposer)
    }

    /// Adds the batch submitter, batching the chain of L2 engine `l2_index`.
    pub async fn add_op_batcher(
        &self,
        l1_index: usize,
        l2_index: usize,
        op_node_index: usize,
        opts: StartOptions,
    ) -> Result<Arc<BatcherNode>, DevnetError> {
        let mut state = self.state.lock().await;
        let client = self.client(Role::OpBatcher)?;
        state.configs()?;
        if state.batcher.is_some() {
            return Err(DevnetError::AlreadyRunning(Role::OpBatcher))
        }
        let eth1 = get(&state.eth1s, Role::Eth1, l1_index)?;
        let l2 = get(&state.l2_engines, Role::OpL2, l2_index)?;
        let op_node = get(&state.op_nodes, Role::OpNode, op_node_index)?;

        let options = batcher_options(
            &self.config.batcher,
            &eth1.ws_url()?,
            &l2.ws_url()?,
            &op_node.rpc_url()?,
            &self.config.mnemonic.mnemonic,
            &self.config.mnemonic.batcher_path,
        );
        let options = merge(options, opts);

        let info = self.launch(&mut state, &client.image, options).await?;
        info!(target: "devnet::orchestrator", ip = %info.ip, "added op-batcher");
        let batcher = Arc::new(BatcherNode { container: info });
        state.batcher = Some(batcher.clone());
        Ok(batcher)
    }

    /// Returns L1 node `index`.
    pub async fn get_eth1(&self, index: usize) -> Result<Arc<L1Node>, DevnetError> {
        get(&self.state.lock().await.eth1s, Role::Eth1, index)
    }

    /// Returns L2 engine `index`.
    pub async fn get_op_l2_engine(&self, index: usize) -> Result<Arc<L2Engine>, DevnetError> {
        get(&self.state.lock().await.l2_engines, Role::OpL2, index)
    }

    /// Returns rollup node `index`, whether or not it was shut down.
    pub async fn get_op_node(&self, index: usize) -> Result<Arc<RollupNode>, DevnetError> {
        get(&self.state.lock().await.op_nodes, Role::OpNode, index)
    }

    /// Returns the live proposer.
    pub async fn proposer(&self) -> Option<Arc<ProposerNode>> {
        self.state.lock().await.proposer.clone()
    }

    /// Returns the live batcher.
    pub async fn batcher(&self) -> Option<Arc<BatcherNode>> {
        self.state.lock().await.batcher.clone()
    }

    /// Stops rollup node `index`.
    pub async fn shutdown_op_node(&self, index: usize) -> Result<(), DevnetError> {
        let mut state = self.state.lock().await;
        let node = get(&state.op_nodes, Role::OpNode, index)?;
        if state.stopped_op_nodes.contains(&index) {
            return Err(DevnetError::NotRunning(Role::OpNode))
        }
        self.runtime.stop_container(&node.container().id).await?;
        state.stopped_op_nodes.insert(index);
        info!(target: "devnet::orchestrator", index, "shut down op-node");
        Ok(())
    }

    /// Stops the batcher.
    pub async fn shutdown_batcher(&self) -> Result<(), DevnetError> {
        let mut state = self.state.lock().await;
        let batcher = state.batcher.clone().ok_or(DevnetError::NotRunning(Role::OpBatcher))?;
        self.runtime.stop_container(&batcher.container.id).await?;
        state.batcher = None;
        info!(target: "devnet::orchestrator", "shut down op-batcher");
        Ok(())
    }

    /// Stops the proposer.
    pub async fn shutdown_proposer(&self) -> Result<(), DevnetError> {
        let mut state = self.state.lock().await;
        let proposer = state.proposer.clone().ok_or(DevnetError::NotRunning(Role::OpProposer))?;
        self.runtime.stop_container(&proposer.container.id).await?;
        state.proposer = None;
        info!(target: "devnet::orchestrator", "shut down op-proposer");
        Ok(())
    }

    /// Removes every container and the devnet network. Keeps going on failures and returns the
    /// first one.
    pub async fn shutdown_all(&self) -> Result<(), DevnetError> {
        let mut state = self.state.lock().await;
        let mut first_err = None;

        for id in std::mem::take(&mut state.containers) {
            if let Err(err) = self.runtime.remove_container(&id).await {
                warn!(target: "devnet::orchestrator", %id, %err, "failed to remove container");
                first_err.get_or_insert(err);
            }
        }
        if let Some(network) = state.network.take() {
            if let Err(err) = self.runtime.remove_network(&network).await {
                warn!(target: "devnet::orchestrator", %network, %err, "failed to remove network");
                first_err.get_or_insert(err);
            }
        }

        state.stopped_op_nodes.extend(0..state.op_nodes.len());
        state.proposer = None;
        state.batcher = None;
        info!(target: "devnet::orchestrator", name = %self.name, "shut down devnet");
        first_err.map_or(Ok(()), |err| Err(err.into()))
    }

    /// Waits until L1 node `index` answers RPC calls.
    pub async fn wait_up_eth1(&self, index: usize, timeout: Duration) -> Result<u64, DevnetError> {
        let node = self.get_eth1(index).await?;
        Ok(wait_up(node.eth(), timeout).await?)
    }

    /// Waits until L2 engine `index` answers RPC calls.
    pub async fn wait_up_op_l2_engine(&self, index: usize, timeout: Duration) -> Result<u64, DevnetError> {
        let node = self.get_op_l2_engine(index).await?;
        Ok(wait_up(node.eth(), timeout).await?)
    }

    /// Waits until rollup node `index` answers RPC calls.
    pub async fn wait_up_op_node(&self, index: usize, timeout: Duration) -> Result<(), DevnetError> {
        let node = self.get_op_node(index).await?;
        Ok(wait_rollup_up(node.rollup(), timeout).await?)
    }

    /// Starts a devnet with one node of each role, the rollup node sequencing, and waits for L1 to
    /// produce its first blocks.
    pub async fn start_sequencer_devnet(&self, params: SequencerDevnetParams) -> Result<(), DevnetError> {
        self.init_chain(params).await?;
        self.add_eth1(StartOptions::default()).await?;
        self.wait_up_eth1(0, Duration::from_secs(10)).await?;
        self.add_op_l2(StartOptions::default()).await?;
        self.wait_up_op_l2_engine(0, Duration::from_secs(10)).await?;
        self.add_op_node(0, 0, true, StartOptions::default()).await?;
        self.add_op_batcher(0, 0, 0, StartOptions::default()).await?;
        self.add_op_proposer(0, 0, 0, StartOptions::default()).await?;

        let l1 = self.get_eth1(0).await?;
        wait_block(l1.eth(), 2, Duration::from_secs(120)).await?;
        info!(target: "devnet::orchestrator", name = %self.name, "sequencer devnet up");
        Ok(())
    }

    /// Returns the vault funding accounts on L1 from the first dev account.
    pub async fn l1_vault(&self) -> Result<Arc<Vault>, DevnetError> {
        let mut state = self.state.lock().await;
        if let Some(vault) = &state.l1_vault {
            return Ok(vault.clone())
        }
        let node = get(&state.eth1s, Role::Eth1, 0)?;
        let vault = Arc::new(Vault::new(self.secrets.alice.clone(), node.http_url()?));
        state.l1_vault = Some(vault.clone());
        Ok(vault)
    }

    /// Returns the vault funding accounts on L2 from the first dev account.
    pub async fn l2_vault(&self) -> Result<Arc<Vault>, DevnetError> {
        let mut state = self.state.lock().await;
        if let Some(vault) = &state.l2_vault {
            return Ok(vault.clone())
        }
        let node = get(&state.l2_engines, Role::OpL2, 0)?;
        let vault = Arc::new(Vault::new(self.secrets.alice.clone(), node.http_url()?));
        state.l2_vault = Some(vault.clone());
        Ok(vault)
    }

    /// Deposits `mint` from the L1 vault account `depositor` to the same account on L2, through
    /// L1 node `l1_index`. Returns the L1 receipt.
    pub async fn deposit(
        &self,
        l1_index: usize,
        depositor: Address,
        mint: U256,
        gas_limit: u64,
    ) -> Result<TransactionReceipt, DevnetError> {
        let node = self.get_eth1(l1_index).await?;
        let signer = self
            .l1_vault()
            .await?
            .signer_for(depositor)
            .ok_or(DevnetError::UnknownAccount(depositor))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(node.http_url()?);

        let call = OptimismPortal::depositTransactionCall {
            _to: depositor,
            _value: U256::ZERO,
            _gasLimit: gas_limit,
            _isCreation: false,
            _data: Bytes::new(),
        };
        let tx = TransactionRequest::default()
            .with_to(self.config.artifacts.deployments.optimism_portal_proxy)
            .with_value(mint)
            .with_input(call.abi_encode())
            .with_gas_limit(3_000_000);

        let tx_hash = *provider.send_transaction(tx).await?.tx_hash();
        let receipt = wait_receipt(&provider, tx_hash, DEPOSIT_TIMEOUT).await?;
        if !receipt.status() {
            return Err(DevnetError::TransactionReverted(tx_hash))
        }
        info!(target: "devnet::orchestrator", %depositor, %mint, %tx_hash, "deposited");
        Ok(receipt)
    }

    /// Withdraws `value` from the vault account `account` on L2 back to the same account on L1,
    /// through L2 engine `l2_index`. Returns the L2 receipt.
    pub async fn initiate_withdrawal(
        &self,
        l2_index: usize,
        account: Address,
        value: U256,
        gas_limit: u64,
    ) -> Result<TransactionReceipt, DevnetError> {
        let node = self.get_op_l2_engine(l2_index).await?;
        let signer = self
            .l1_vault()
            .await?
            .signer_for(account)
            .ok_or(DevnetError::UnknownAccount(account))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(node.http_url()?);

        let call = L2ToL1MessagePasser::initiateWithdrawalCall {
            _target: account,
            _gasLimit: U256::from(gas_limit),
            _data: Bytes::new(),
        };
        let tx = TransactionRequest::default()
            .with_to(L2_TO_L1_MESSAGE_PASSER)
            .with_value(value)
            .with_input(call.abi_encode());

        let tx_hash = *provider.send_transaction(tx).await?.tx_hash();
        let receipt = wait_receipt(&provider, tx_hash, WITHDRAWAL_TIMEOUT).await?;
        if !receipt.status() {
            return Err(DevnetError::TransactionReverted(tx_hash))
        }
        info!(target: "devnet::orchestrator", %account, %value, %tx_hash, block = ?receipt.block_number, "initiated withdrawal");
        Ok(receipt)
    }

    /// Waits until an output covering L2 block `l2_block` is proposed to L1 and its finalization
    /// period passed on L1 node `l1_index`. Returns the L2 block of that output.
    pub async fn wait_for_finalization_period(
        &self,
        l1_index: usize,
        l2_block: u64,
        timeout: Duration,
    ) -> Result<u64, DevnetError> {
        let l1 = self.get_eth1(l1_index).await?;
        let provider = l1.eth();
        let oracle = self.config.artifacts.deployments.l2_output_oracle_proxy;
        let portal = self.config.artifacts.deployments.optimism_portal_proxy;

        let wait = async {
            let interval: U256 =
                view(provider, oracle, L2OutputOracle::SUBMISSION_INTERVALCall {}).await?;
            let output_block = next_output_block(l2_block, interval.saturating_to());
            let period: U256 =
                view(provider, portal, OptimismPortal::FINALIZATION_PERIOD_SECONDSCall {}).await?;

            loop {
                let latest: U256 =
                    view(provider, oracle, L2OutputOracle::latestBlockNumberCall {}).await?;
                if latest >= U256::from(output_block) {
                    break
                }
                debug!(target: "devnet::orchestrator", %latest, output_block, "waiting for output proposal");
                tokio::time::sleep(FINALIZATION_POLL_INTERVAL).await;
            }

            let output = view(
                provider,
                oracle,
                L2OutputOracle::getL2OutputCall { _l2BlockNumber: U256::from(output_block) },
            )
            .await?;
            if output.outputRoot.is_zero() {
                return Err(DevnetError::MissingOutput(output_block))
            }
            let finalized_at = output.timestamp.saturating_add(period);
            info!(target: "devnet::orchestrator", output_block, root = %output.outputRoot, %finalized_at, "output proposed");

            loop {
                let head = provider
                    .get_block_by_number(BlockNumberOrTag::Latest)
                    .await?
                    .ok_or(DevnetError::MissingBlock(BlockNumberOrTag::Latest))?;
                if U256::from(head.header.timestamp) > finalized_at {
                    return Ok(output_block)
                }
                tokio::time::sleep(FINALIZATION_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.map_err(|_| {
            WaitError::timeout(format!("finalization of the output covering L2 block #{l2_block}"), timeout)
        })?
    }

    /// Finalizes on L1 node `l1_index` the withdrawal initiated by `withdrawal_tx` on L2 engine
    /// `l2_index`, proving it against the output of L2 block `output_block`. The finalization is
    /// sent by the vault account `account`. Returns the L1 receipt.
    pub async fn finalize_withdrawal(
        &self,
        l1_index: usize,
        l2_index: usize,
        account: Address,
        withdrawal_tx: TxHash,
        output_block: u64,
    ) -> Result<TransactionReceipt, DevnetError> {
        let l2 = self.get_op_l2_engine(l2_index).await?;
        let l2 = l2.eth();
        let receipt = l2
            .get_transaction_receipt(withdrawal_tx)
            .await?
            .ok_or(DevnetError::MissingWithdrawal(withdrawal_tx))?;
        let withdrawal = withdrawal_from_logs(receipt.inner.logs().iter().map(|log| &log.inner))
            .ok_or(DevnetError::MissingWithdrawal(withdrawal_tx))?;

        let tag = BlockNumberOrTag::Number(output_block);
        let header = l2.get_block_by_number(tag).await?.ok_or(DevnetError::MissingBlock(tag))?.header;
        let proof = l2
            .get_proof(L2_TO_L1_MESSAGE_PASSER, vec![withdrawal.storage_slot()])
            .block_id(tag.into())
            .await?;
        let nodes = proof
            .storage_proof
            .first()
            .map(|storage| storage.proof.as_slice())
            .unwrap_or_default();

        let call = OptimismPortal::finalizeWithdrawalTransactionCall {
            _tx: withdrawal,
            _l2BlockNumber: U256::from(output_block),
            _outputRootProof: OutputRootProof::new(header.state_root, proof.storage_hash, header.hash),
            _withdrawalProof: encode_withdrawal_proof(nodes),
        };

        let l1 = self.get_eth1(l1_index).await?;
        let signer = self
            .l1_vault()
            .await?
            .signer_for(account)
            .ok_or(DevnetError::UnknownAccount(account))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(l1.http_url()?);
        let tx = TransactionRequest::default()
            .with_to(self.config.artifacts.deployments.optimism_portal_proxy)
            .with_input(call.abi_encode());

        let tx_hash = *provider.send_transaction(tx).await?.tx_hash();
        let receipt = wait_receipt(&provider, tx_hash, WITHDRAWAL_TIMEOUT).await?;
        if !receipt.status() {
            return Err(DevnetError::TransactionReverted(tx_hash))
        }
        info!(target: "devnet::orchestrator", %account, %withdrawal_tx, %tx_hash, output_block, "finalized withdrawal");
        Ok(receipt)
    }
}

/// Calls the view function `call` of the contract at `to` and decodes what it returns.
async fn view<P, C>(provider: &P, to: Address, call: C) -> Result<C::Return, DevnetError>
where
    P: Provider,
    C: SolCall,
{
    let tx = TransactionRequest::default().with_to(to).with_input(call.abi_encode());
    let output = provider.call(tx).await?;
    Ok(C::abi_decode_returns(&output)?)
}
