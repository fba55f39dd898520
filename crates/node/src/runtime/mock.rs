use super::{ContainerId, ContainerInfo, ContainerRuntime, NetworkId, RuntimeError, StartOptions};
use parking_lot::Mutex;
use std::{
    collections::HashSet,
    net::{IpAddr, Ipv4Addr},
};

/// An event recorded by the [`MockRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A network was created.
    NetworkCreated(String),
    /// A network was removed.
    NetworkRemoved(String),
    /// A container was started.
    Started {
        /// The container id.
        id: ContainerId,
        /// The image.
        image: String,
        /// The options it was started with.
        options: StartOptions,
    },
    /// A container was stopped.
    Stopped(ContainerId),
    /// A container was removed.
    Removed(ContainerId),
}

/// A [`ContainerRuntime`] that records what it is asked to do without starting anything.
#[derive(Debug, Default)]
pub struct MockRuntime {
    inner: Mutex<MockRuntimeInner>,
}

#[derive(Debug, Default)]
struct MockRuntimeInner {
    events: Vec<RuntimeEvent>,
    created: Vec<(ContainerId, String)>,
    stopped: HashSet<ContainerId>,
    fail_images: HashSet<String>,
}

impl MockRuntime {
    /// Returns a new [`MockRuntime`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every container started from `image` fail to start.
    pub fn fail_image(&self, image: impl Into<String>) {
        self.inner.lock().fail_images.insert(image.into());
    }

    /// Returns every recorded event.
    pub fn events(&self) -> Vec<RuntimeEvent> {
        self.inner.lock().events.clone()
    }

    /// Returns the images and options of the started containers, in start order.
    pub fn started(&self) -> Vec<(String, StartOptions)> {
        self.inner
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::Started { image, options, .. } => Some((image.clone(), options.clone())),
                _ => None,
            })
            .collect()
    }

    fn image_of(&self, id: &ContainerId) -> Result<String, RuntimeError> {
        self.inner
            .lock()
            .created
            .iter()
            .find(|(created, _)| created == id)
            .map(|(_, image)| image.clone())
            .ok_or_else(|| RuntimeError::UnknownContainer(id.clone()))
    }

    /// Returns true if the container was stopped.
    pub fn is_stopped(&self, id: &ContainerId) -> bool {
        self.inner.lock().stopped.contains(id)
    }
}

#[async_trait::async_trait]
impl ContainerRuntime for MockRuntime {
    async fn create_network(&self, name: &str) -> Result<NetworkId, RuntimeError> {
        self.inner.lock().events.push(RuntimeEvent::NetworkCreated(name.to_string()));
        Ok(NetworkId(name.to_string()))
    }

    async fn remove_network(&self, network: &NetworkId) -> Result<(), RuntimeError> {
        self.inner.lock().events.push(RuntimeEvent::NetworkRemoved(network.0.clone()));
        Ok(())
    }

    async fn create_container(
        &self,
        image: &str,
        _options: &StartOptions,
    ) -> Result<ContainerId, RuntimeError> {
        let mut inner = self.inner.lock();
        if inner.fail_images.contains(image) {
            return Err(RuntimeError::Command {
                command: format!("create {image}"),
                stderr: "image failed to start".to_string(),
            })
        }

        let id = ContainerId(format!("container-{}", inner.created.len() + 1));
        inner.created.push((id.clone(), image.to_string()));
        Ok(id)
    }

    async fn connect_container(&self, id: &ContainerId, _network: &NetworkId) -> Result<(), RuntimeError> {
        self.image_of(id).map(|_| ())
    }

    async fn start_container(
        &self,
        id: &ContainerId,
        options: &StartOptions,
    ) -> Result<ContainerInfo, RuntimeError> {
        let image = self.image_of(id)?;
        let mut inner = self.inner.lock();
        let index = inner.created.iter().position(|(created, _)| created == id).unwrap_or_default() + 1;
        inner.events.push(RuntimeEvent::Started {
            id: id.clone(),
            image,
            options: options.clone(),
        });
        Ok(ContainerInfo { id: id.clone(), ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, index as u8)) })
    }

    async fn stop_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.image_of(id)?;
        let mut inner = self.inner.lock();
        inner.stopped.insert(id.clone());
        inner.events.push(RuntimeEvent::Stopped(id.clone()));
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.image_of(id)?;
        self.inner.lock().events.push(RuntimeEvent::Removed(id.clone()));
        Ok(())
    }

    async fn logs(&self, id: &ContainerId) -> Result<String, RuntimeError> {
        self.image_of(id)?;
        Ok(String::new())
    }
}
