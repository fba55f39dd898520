use super::{ContainerId, ContainerInfo, ContainerRuntime, NetworkId, RuntimeError, StartOptions};
use std::{net::IpAddr, path::Path};
use tokio::process::Command;
use tracing::{debug, trace};

/// The template used to list the addresses of a container, one `network=ip` pair per line.
const IP_TEMPLATE: &str =
    "{{range $name, $net := .NetworkSettings.Networks}}{{$name}}={{$net.IPAddress}}\n{{end}}";

/// A [`ContainerRuntime`] driving the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self { binary: "docker".to_string() }
    }
}

impl DockerCli {
    /// Returns a runtime using the docker binary at `binary`.
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    async fn run<I, S>(&self, args: I) -> Result<String, RuntimeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = Command::new(&self.binary);
        command.args(args).kill_on_drop(true);
        let description = format!("{command:?}");
        trace!(target: "devnet::runtime", command = %description, "running");

        let output = command
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn { command: description.clone(), source })?;
        if !output.status.success() {
            return Err(RuntimeError::Command {
                command: description,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Copies `files` into the created container `id`.
    async fn inject_files(&self, id: &ContainerId, options: &StartOptions) -> Result<(), RuntimeError> {
        if options.files.is_empty() {
            return Ok(())
        }

        let staging = tempfile::tempdir()
            .map_err(|source| RuntimeError::Stage { path: "/".to_string(), source })?;
        for (path, content) in &options.files {
            stage_file(staging.path(), path, content).await?;
        }

        let source = format!("{}/.", staging.path().display());
        self.run(["cp".to_string(), source, format!("{id}:/")]).await?;
        Ok(())
    }

    async fn container_ip(&self, id: &ContainerId) -> Result<IpAddr, RuntimeError> {
        let output = self.run(["inspect", "--format", IP_TEMPLATE, id.0.as_str()]).await?;
        parse_container_ip(&output).ok_or_else(|| RuntimeError::MissingIp(id.clone()))
    }
}

/// Writes `content` at `path` below the staging `root`.
async fn stage_file(root: &Path, path: &str, content: &[u8]) -> Result<(), RuntimeError> {
    let target = root.join(path.trim_start_matches('/'));
    let stage_err = |source| RuntimeError::Stage { path: path.to_string(), source };
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(stage_err)?;
    }
    tokio::fs::write(&target, content).await.map_err(stage_err)
}

/// Picks the address of the container out of `inspect` output, preferring networks other than the
/// default bridge.
fn parse_container_ip(output: &str) -> Option<IpAddr> {
    let addresses = output
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter_map(|(name, ip)| Some((name.trim(), ip.trim().parse::<IpAddr>().ok()?)))
        .collect::<Vec<_>>();

    addresses
        .iter()
        .find(|(name, _)| *name != "bridge")
        .or_else(|| addresses.first())
        .map(|(_, ip)| *ip)
}

#[async_trait::async_trait]
impl ContainerRuntime for DockerCli {
    async fn create_network(&self, name: &str) -> Result<NetworkId, RuntimeError> {
        let id = self.run(["network", "create", name]).await?;
        debug!(target: "devnet::runtime", name, %id, "created network");
        Ok(NetworkId(name.to_string()))
    }

    async fn remove_network(&self, network: &NetworkId) -> Result<(), RuntimeError> {
        self.run(["network", "rm", network.0.as_str()]).await?;
        Ok(())
    }

    async fn create_container(
        &self,
        image: &str,
        options: &StartOptions,
    ) -> Result<ContainerId, RuntimeError> {
        let mut args = vec!["create".to_string()];
        for (key, value) in &options.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(image.to_string());

        let id = ContainerId(self.run(args).await?);
        debug!(target: "devnet::runtime", image, %id, "created container");
        Ok(id)
    }

    async fn connect_container(&self, id: &ContainerId, network: &NetworkId) -> Result<(), RuntimeError> {
        self.run(["network", "connect", network.0.as_str(), id.0.as_str()]).await?;
        Ok(())
    }

    async fn start_container(
        &self,
        id: &ContainerId,
        options: &StartOptions,
    ) -> Result<ContainerInfo, RuntimeError> {
        self.inject_files(id, options).await?;
        self.run(["start", id.0.as_str()]).await?;

        let ip = self.container_ip(id).await?;
        debug!(target: "devnet::runtime", %id, %ip, "started container");
        Ok(ContainerInfo { id: id.clone(), ip })
    }

    async fn stop_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.run(["stop", "-t", "10", id.0.as_str()]).await?;
        debug!(target: "devnet::runtime", %id, "stopped container");
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.run(["rm", "-f", id.0.as_str()]).await?;
        Ok(())
    }

    async fn logs(&self, id: &ContainerId) -> Result<String, RuntimeError> {
        self.run(["logs", id.0.as_str()]).await
    }
}
