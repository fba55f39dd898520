/// An enum representing the errors that can occur while deriving devnet keys.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The key could not be derived from the mnemonic.
    #[error("failed to derive key at {path}: {source}")]
    Derivation {
        /// The derivation path that failed.
        path: String,
        /// The underlying error.
        #[source]
        source: alloy_signer_local::LocalSignerError,
    },
}
