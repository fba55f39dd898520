//! The container runtime the devnet runs on.

mod docker;
pub use docker::DockerCli;

#[cfg(any(test, feature = "test-utils"))]
mod mock;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockRuntime, RuntimeEvent};

use std::{collections::BTreeMap, net::IpAddr};

/// The id of a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct ContainerId(pub String);

/// The id of a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct NetworkId(pub String);

/// The options a container is started with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Environment variables.
    pub env: BTreeMap<String, String>,
    /// Files injected into the container before it starts, keyed by absolute path.
    pub files: BTreeMap<String, Vec<u8>>,
}

impl StartOptions {
    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.env.insert(key.into(), value.to_string());
        self
    }

    /// Adds a file.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

/// A started container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// The container id.
    pub id: ContainerId,
    /// The address of the container on the devnet network.
    pub ip: IpAddr,
}

/// An error returned by a [`ContainerRuntime`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A runtime command could not be executed.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// The command.
        command: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A runtime command exited with an error.
    #[error("{command} failed: {stderr}")]
    Command {
        /// The command.
        command: String,
        /// The captured standard error.
        stderr: String,
    },
    /// A file could not be staged for injection.
    #[error("failed to stage {path}: {source}")]
    Stage {
        /// The path of the file in the container.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The container has no address.
    #[error("container {0} has no ip address")]
    MissingIp(ContainerId),
    /// The container is unknown to the runtime.
    #[error("unknown container {0}")]
    UnknownContainer(ContainerId),
}

/// A container runtime able to host devnet nodes.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait ContainerRuntime: Send + Sync + std::fmt::Debug {
    /// Creates a network.
    async fn create_network(&self, name: &str) -> Result<NetworkId, RuntimeError>;

    /// Removes a network.
    async fn remove_network(&self, network: &NetworkId) -> Result<(), RuntimeError>;

    /// Creates a container from `image` with the environment of `options`.
    async fn create_container(
        &self,
        image: &str,
        options: &StartOptions,
    ) -> Result<ContainerId, RuntimeError>;

    /// Attaches a created container to `network`.
    async fn connect_container(&self, id: &ContainerId, network: &NetworkId) -> Result<(), RuntimeError>;

    /// Injects the files of `options` into a created container and starts it.
    async fn start_container(
        &self,
        id: &ContainerId,
        options: &StartOptions,
    ) -> Result<ContainerInfo, RuntimeError>;

    /// Stops a container. The container is kept so its logs stay available.
    async fn stop_container(&self, id: &ContainerId) -> Result<(), RuntimeError>;

    /// Removes a container.
    async fn remove_container(&self, id: &ContainerId) -> Result<(), RuntimeError>;

    /// Returns the logs of a container.
    async fn logs(&self, id: &ContainerId) -> Result<String, RuntimeError>;

    /// Creates a container from `image`, attaches it to `network` and starts it. A container that
    /// fails to come up is removed again.
    async fn launch(
        &self,
        image: &str,
        network: &NetworkId,
        options: &StartOptions,
    ) -> Result<ContainerInfo, RuntimeError> {
        let id = self.create_container(image, options).await?;
        let started = match self.connect_container(&id, network).await {
            Ok(()) => self.start_container(&id, options).await,
            Err(err) => Err(err),
        };
        if started.is_err() {
            if let Err(err) = self.remove_container(&id).await {
                tracing::warn!(target: "devnet::runtime", %id, %err, "failed to remove container");
            }
        }
        started
    }
}
