use crate::{
    AlloyExecutionPayloadProvider, EngineApiError, EngineApiMetrics, EngineCall,
    EnginePayloadAttributes, ExecutionPayloadProvider, ExecutionPayloadProviderError,
};
use alloy_eips::BlockId;
use alloy_json_rpc::{RpcRecv, RpcSend};
use alloy_network::Ethereum;
use alloy_primitives::Bytes;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_engine::{
    ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdated, JwtSecret, PayloadId, PayloadStatus,
    PayloadStatusEnum,
};
use alloy_transport_http::{
    hyper_util::{client::legacy::Client, rt::TokioExecutor},
    AuthLayer, Http, HyperClient,
};
use devnet_primitives::{constants::ENGINE_CALL_TIMEOUT, L1BlockRef};
use http_body_util::Full;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tracing::{debug, error, trace};
use url::Url;

/// The Engine API of an execution client.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait EngineApi: Send + Sync {
    /// Calls `engine_forkchoiceUpdatedV1`. With attributes, the engine starts building a payload
    /// on top of the new head and returns its id.
    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        attributes: Option<EnginePayloadAttributes>,
    ) -> Result<ForkchoiceUpdated, EngineApiError>;

    /// Calls `engine_newPayloadV1`.
    async fn new_payload(&self, payload: ExecutionPayloadV1) -> Result<PayloadStatus, EngineApiError>;

    /// Calls `engine_getPayloadV1`.
    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayloadV1, EngineApiError>;
}

/// A node driven through its Engine API whose chain can also be read back.
pub trait EngineNode: EngineApi + ExecutionPayloadProvider {}

impl<T: EngineApi + ExecutionPayloadProvider + ?Sized> EngineNode for T {}

/// The kind of chain an engine serves.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineKind {
    /// An L1 execution client. Only accepts standard payload attributes.
    L1,
    /// A rollup execution client.
    L2,
}

/// An Engine API client for a single execution client endpoint.
///
/// Every call is bounded by a timeout and never retried. The client also reads the chain it
/// drives through the same endpoint, see [`ExecutionPayloadProvider`].
#[derive(Debug, Clone)]
pub struct EngineClient {
    kind: EngineKind,
    provider: RootProvider<Ethereum>,
    chain: AlloyExecutionPayloadProvider<RootProvider<Ethereum>>,
    timeout: Duration,
    metrics: EngineApiMetrics,
}

impl EngineClient {
    /// Returns a new [`EngineClient`] for the endpoint at `url`. If a JWT secret is provided,
    /// every request is authenticated with it.
    pub fn new(kind: EngineKind, url: Url, jwt: Option<JwtSecret>) -> Self {
        let provider = match jwt {
            Some(jwt) => Self::auth_provider(url, jwt),
            None => RootProvider::new_http(url),
        };
        Self {
            kind,
            chain: AlloyExecutionPayloadProvider::new(provider.clone()),
            provider,
            timeout: ENGINE_CALL_TIMEOUT,
            metrics: EngineApiMetrics::default(),
        }
    }

    /// Sets the timeout applied to each call.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the kind of the engine.
    pub const fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Returns the underlying provider.
    pub const fn provider(&self) -> &RootProvider<Ethereum> {
        &self.provider
    }

    fn auth_provider(url: Url, jwt: JwtSecret) -> RootProvider<Ethereum> {
        let hyper_client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
        let auth_layer = AuthLayer::new(jwt);
        let service = ServiceBuilder::new().layer(auth_layer).service(hyper_client);
        let layer_transport = HyperClient::with_service(service);
        let http_hyper = Http::with_client(layer_transport, url);
        let rpc_client = RpcClient::new(http_hyper, false);
        RootProvider::new(rpc_client)
    }

    async fn request<Params, Resp>(
        &self,
        call: EngineCall,
        params: Params,
    ) -> Result<Resp, EngineApiError>
    where
        Params: RpcSend,
        Resp: RpcRecv,
    {
        let request = self.provider.client().request(call.method(), params);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(|err| EngineApiError::from_rpc(call, err)),
            Err(_) => Err(EngineApiError::Timeout { call, after: self.timeout }),
        }
    }
}

#[async_trait::async_trait]
impl EngineApi for EngineClient {
    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        attributes: Option<EnginePayloadAttributes>,
    ) -> Result<ForkchoiceUpdated, EngineApiError> {
        if self.kind == EngineKind::L1 {
            if let Some(attributes) = &attributes {
                assert!(
                    !attributes.has_rollup_fields(),
                    "L1 engines do not accept transactions, no_tx_pool or gas_limit attributes"
                );
            }
        }

        let now = Instant::now();
        let forkchoice_updated: ForkchoiceUpdated =
            self.request(EngineCall::ForkchoiceUpdated, (state, attributes)).await?;
        self.metrics.forkchoice_updated_duration.record(now.elapsed().as_secs_f64());

        match &forkchoice_updated.payload_status.status {
            PayloadStatusEnum::Invalid { validation_error } => {
                error!(target: "devnet::engine", head = %state.head_block_hash, ?validation_error, "failed to issue forkchoice");
            }
            PayloadStatusEnum::Syncing => {
                debug!(target: "devnet::engine", head = %state.head_block_hash, "head has been seen before, but not part of the chain");
            }
            PayloadStatusEnum::Accepted => {
                debug!(target: "devnet::engine", head = %state.head_block_hash, "forkchoice accepted");
            }
            PayloadStatusEnum::Valid => {
                trace!(target: "devnet::engine", head = %state.head_block_hash, payload_id = ?forkchoice_updated.payload_id, "forkchoice updated");
            }
        };

        Ok(forkchoice_updated)
    }

    async fn new_payload(&self, payload: ExecutionPayloadV1) -> Result<PayloadStatus, EngineApiError> {
        let number = payload.block_number;
        let hash = payload.block_hash;

        let now = Instant::now();
        let status: PayloadStatus = self.request(EngineCall::NewPayload, (payload,)).await?;
        self.metrics.new_payload_duration.record(now.elapsed().as_secs_f64());

        match &status.status {
            PayloadStatusEnum::Invalid { validation_error } => {
                error!(target: "devnet::engine", number, %hash, ?validation_error, "execution payload is invalid");
            }
            PayloadStatusEnum::Syncing => {
                debug!(target: "devnet::engine", number, %hash, "execution client is syncing");
            }
            PayloadStatusEnum::Accepted => {
                debug!(target: "devnet::engine", number, %hash, "execution payload part of side chain");
            }
            PayloadStatusEnum::Valid => {
                trace!(target: "devnet::engine", number, %hash, "execution payload valid");
            }
        };

        Ok(status)
    }

    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayloadV1, EngineApiError> {
        let now = Instant::now();
        let payload: ExecutionPayloadV1 =
            self.request(EngineCall::GetPayload, (payload_id,)).await?;
        self.metrics.get_payload_duration.record(now.elapsed().as_secs_f64());

        trace!(target: "devnet::engine", %payload_id, number = payload.block_number, hash = %payload.block_hash, "retrieved payload");
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl ExecutionPayloadProvider for EngineClient {
    async fn execution_payload_by_block(
        &self,
        block_id: BlockId,
    ) -> Result<Option<ExecutionPayloadV1>, ExecutionPayloadProviderError> {
        self.chain.execution_payload_by_block(block_id).await
    }

    async fn block_ref(
        &self,
        block_id: BlockId,
    ) -> Result<Option<L1BlockRef>, ExecutionPayloadProviderError> {
        self.chain.block_ref(block_id).await
    }
}
