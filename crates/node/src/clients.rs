use serde::{Deserialize, Serialize};

/// A role a client can play in the devnet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// An L1 execution client.
    #[serde(rename = "eth1")]
    Eth1,
    /// An L2 execution engine.
    #[serde(rename = "op-l2")]
    OpL2,
    /// A rollup node.
    #[serde(rename = "op-node")]
    OpNode,
    /// An output proposer.
    #[serde(rename = "op-proposer")]
    OpProposer,
    /// A batch submitter.
    #[serde(rename = "op-batcher")]
    OpBatcher,
}

impl Role {
    /// Every role.
    pub const ALL: [Self; 5] = [Self::Eth1, Self::OpL2, Self::OpNode, Self::OpProposer, Self::OpBatcher];

    /// Returns the name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eth1 => "eth1",
            Self::OpL2 => "op-l2",
            Self::OpNode => "op-node",
            Self::OpProposer => "op-proposer",
            Self::OpBatcher => "op-batcher",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|role| role.as_str() == s).ok_or_else(|| format!("unknown role {s}"))
    }
}

/// A client image available to the devnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDefinition {
    /// The client name.
    pub name: String,
    /// The container image.
    pub image: String,
    /// The roles the client can play.
    pub roles: Vec<Role>,
}

impl ClientDefinition {
    /// Returns true if the client can play `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl core::str::FromStr for ClientDefinition {
    type Err = String;

    /// Parses `name=image:role[,role]`. The image may contain a tag, so roles are split off at
    /// the last `:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s.split_once('=').ok_or_else(|| format!("missing '=' in {s}"))?;
        let (image, roles) = rest.rsplit_once(':').ok_or_else(|| format!("missing roles in {s}"))?;
        let roles = roles.split(',').map(str::parse).collect::<Result<Vec<Role>, _>>()?;
        if name.is_empty() || image.is_empty() {
            return Err(format!("empty name or image in {s}"))
        }
        Ok(Self { name: name.to_string(), image: image.to_string(), roles })
    }
}

/// Client definitions grouped by the role they can play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientsByRole {
    /// L1 execution clients.
    pub eth1: Vec<ClientDefinition>,
    /// L2 execution engines.
    pub op_l2: Vec<ClientDefinition>,
    /// Rollup nodes.
    pub op_node: Vec<ClientDefinition>,
    /// Output proposers.
    pub op_proposer: Vec<ClientDefinition>,
    /// Batch submitters.
    pub op_batcher: Vec<ClientDefinition>,
}

impl ClientsByRole {
    /// Groups the definitions by role. A client with several roles appears in each of them.
    pub fn from_definitions(definitions: impl IntoIterator<Item = ClientDefinition>) -> Self {
        let mut clients = Self::default();
        for definition in definitions {
            for role in &definition.roles {
                clients.for_role_mut(*role).push(definition.clone());
            }
        }
        clients
    }

    /// Returns the clients able to play `role`.
    pub fn for_role(&self, role: Role) -> &[ClientDefinition] {
        match role {
            Role::Eth1 => &self.eth1,
            Role::OpL2 => &self.op_l2,
            Role::OpNode => &self.op_node,
            Role::OpProposer => &self.op_proposer,
            Role::OpBatcher => &self.op_batcher,
        }
    }

    /// Returns the client used for `role`, which is the first registered one.
    pub fn first(&self, role: Role) -> Option<&ClientDefinition> {
        self.for_role(role).first()
    }

    fn for_role_mut(&mut self, role: Role) -> &mut Vec<ClientDefinition> {
        match role {
            Role::Eth1 => &mut self.eth1,
            Role::OpL2 => &mut self.op_l2,
            Role::OpNode => &mut self.op_node,
            Role::OpProposer => &mut self.op_proposer,
            Role::OpBatcher => &mut self.op_batcher,
        }
    }
}
