use devnet_node::{ClientDefinition, ClientsByRole};

/// The clients used when none are configured.
pub const DEFAULT_CLIENTS: &[&str] = &[
    "geth=hive/eth1-geth:latest:eth1",
    "op-geth=hive/op-geth:latest:op-l2",
    "op-node=hive/op-node:latest:op-node",
    "op-proposer=hive/op-proposer:latest:op-proposer",
    "op-batcher=hive/op-batcher:latest:op-batcher",
];

/// Returns the clients listed in `DEVNET_CLIENTS`, separated by `;`, or the default clients.
pub fn clients_from_env() -> eyre::Result<ClientsByRole> {
    let definitions = match std::env::var("DEVNET_CLIENTS") {
        Ok(raw) => raw.split(';').filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string()).collect(),
        Err(_) => DEFAULT_CLIENTS.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    };
    let definitions = definitions
        .iter()
        .map(|def| def.parse::<ClientDefinition>().map_err(|err| eyre::eyre!(err)))
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok(ClientsByRole::from_definitions(definitions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_node::Role;

    #[test]
    fn test_default_clients_cover_every_role() {
        let clients = ClientsByRole::from_definitions(
            DEFAULT_CLIENTS.iter().map(|def| def.parse::<ClientDefinition>().unwrap()).collect::<Vec<_>>(),
        );
        for role in Role::ALL {
            assert!(clients.first(role).is_some(), "missing {role}");
        }
        assert_eq!(clients.first(Role::OpL2).unwrap().image, "hive/op-geth:latest");
    }
}
