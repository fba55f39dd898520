use alloy_primitives::B256;
use std::path::PathBuf;

/// An error that occurred while building or validating the chain configuration.
#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    /// A field of the rollup config holds an invalid value.
    #[error("invalid rollup config: {0}")]
    InvalidRollupConfig(&'static str),
    /// The rollup config references a genesis block that does not match the computed one.
    #[error("{chain} genesis mismatch: rollup config has {expected}, computed {actual}")]
    GenesisMismatch {
        /// Which chain the mismatch is on.
        chain: &'static str,
        /// The hash in the rollup config.
        expected: B256,
        /// The hash of the computed genesis block.
        actual: B256,
    },
    /// The deploy config is inconsistent.
    #[error("invalid deploy config: {0}")]
    InvalidDeployConfig(&'static str),
    /// Failed to read an artifact file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The artifact path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to (de)serialize a config or artifact.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
