use crate::DevnetError;
use alloy_network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use devnet_watcher::wait_receipt;
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};
use tracing::info;
use url::Url;

/// How long a funding transaction may take to be included.
const FUNDING_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates funded accounts on one chain and keeps their keys.
pub struct Vault {
    url: Url,
    funder: DynProvider<Ethereum>,
    /// Serializes funding so the funder nonce is read after the previous send.
    send_lock: tokio::sync::Mutex<()>,
    accounts: Mutex<HashMap<Address, PrivateKeySigner>>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("url", &self.url)
            .field("accounts", &self.accounts.lock().len())
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Returns a vault funding accounts from `funder` on the chain at `url`.
    pub fn new(funder: PrivateKeySigner, url: Url) -> Self {
        let funder =
            ProviderBuilder::new().wallet(EthereumWallet::from(funder)).connect_http(url.clone()).erased();
        Self { url, funder, send_lock: Default::default(), accounts: Default::default() }
    }

    /// Creates a new account, funds it with `amount` and returns its address once the funding
    /// transaction is included.
    pub async fn create_account(&self, amount: U256) -> Result<Address, DevnetError> {
        let signer = PrivateKeySigner::random();
        let address = signer.address();

        let tx = TransactionRequest::default().with_to(address).with_value(amount);
        let tx_hash = {
            let _guard = self.send_lock.lock().await;
            *self.funder.send_transaction(tx).await?.tx_hash()
        };
        let receipt = wait_receipt(&self.funder, tx_hash, FUNDING_TIMEOUT).await?;
        if !receipt.status() {
            return Err(DevnetError::TransactionReverted(tx_hash))
        }

        info!(target: "devnet::orchestrator", %address, %amount, "created vault account");
        self.accounts.lock().insert(address, signer);
        Ok(address)
    }

    /// Returns the signer of an account created by the vault.
    pub fn signer_for(&self, address: Address) -> Option<PrivateKeySigner> {
        self.accounts.lock().get(&address).cloned()
    }

    /// Returns a provider signing with the key of `address`.
    pub fn provider_for(&self, address: Address) -> Result<DynProvider<Ethereum>, DevnetError> {
        let signer = self.signer_for(address).ok_or(DevnetError::UnknownAccount(address))?;
        Ok(ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.url.clone())
            .erased())
    }
}
