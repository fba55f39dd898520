use crate::{deadline::Deadline, WaitError, WatcherMetrics};
use alloy_primitives::{TxHash, B256};
use alloy_provider::Provider;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The part of a receipt that changes when the transaction is re-included by a reorg.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReceiptFingerprint {
    /// The block the transaction was included in.
    pub block_number: u64,
    /// The hash of that block.
    pub block_hash: B256,
    /// Whether the transaction succeeded.
    pub status: bool,
}

/// A source of transaction receipts and the chain head.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait ReceiptSource: Send + Sync {
    /// Returns the fingerprint of the receipt of `tx`, if the transaction is included.
    async fn receipt(&self, tx: TxHash) -> Result<Option<ReceiptFingerprint>, WaitError>;

    /// Returns the number of the head block.
    async fn head(&self) -> Result<u64, WaitError>;
}

/// A [`ReceiptSource`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct ProviderReceiptSource<P> {
    provider: P,
}

impl<P> ProviderReceiptSource<P> {
    /// Returns a new [`ProviderReceiptSource`].
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P: Provider> ReceiptSource for ProviderReceiptSource<P> {
    async fn receipt(&self, tx: TxHash) -> Result<Option<ReceiptFingerprint>, WaitError> {
        let receipt = self.provider.get_transaction_receipt(tx).await?;
        Ok(receipt.and_then(|receipt| {
            Some(ReceiptFingerprint {
                block_number: receipt.block_number?,
                block_hash: receipt.block_hash?,
                status: receipt.status(),
            })
        }))
    }

    async fn head(&self) -> Result<u64, WaitError> {
        Ok(self.provider.get_block_number().await?)
    }
}

/// Options of [`wait_for_confirmations`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConfirmationOpts {
    /// The interval the receipt and head are polled at.
    pub poll_interval: Duration,
    /// The overall deadline, reorgs included.
    pub timeout: Duration,
}

impl Default for ConfirmationOpts {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(1), timeout: Duration::from_secs(60) }
    }
}

/// Waits until `tx` is buried under `confirmations` blocks and returns its receipt.
///
/// The receipt is re-read on every poll. If it disappears or moves to another block, the wait
/// starts over from the new inclusion block. All of it happens within one deadline: the error is
/// [`WaitError::NotFound`] if the transaction was never seen included and
/// [`WaitError::Timeout`] otherwise. A call to `source` that hangs is abandoned at the deadline.
pub async fn wait_for_confirmations<S>(
    source: &S,
    tx: TxHash,
    confirmations: u64,
    opts: ConfirmationOpts,
) -> Result<ReceiptFingerprint, WaitError>
where
    S: ReceiptSource + ?Sized,
{
    let metrics = WatcherMetrics::default();
    let start = Instant::now();
    let deadline = Deadline::after(opts.timeout);
    let mut included: Option<ReceiptFingerprint> = None;
    let mut seen = false;

    loop {
        let Some(receipt) = deadline.run(source.receipt(tx)).await else { break };
        match receipt? {
            Some(receipt) => {
                seen = true;
                match included {
                    Some(previous) if previous != receipt => {
                        warn!(target: "devnet::watcher", %tx, from = %previous.block_hash, to = %receipt.block_hash, "transaction moved by reorg, restarting wait");
                        metrics.reorgs.increment(1);
                    }
                    None => {
                        debug!(target: "devnet::watcher", %tx, block = receipt.block_number, "transaction included")
                    }
                    _ => {}
                }
                included = Some(receipt);

                let Some(head) = deadline.run(source.head()).await else { break };
                if head? >= receipt.block_number + confirmations {
                    metrics.confirmation_duration.record(start.elapsed().as_secs_f64());
                    return Ok(receipt)
                }
            }
            None => {
                if let Some(previous) = included.take() {
                    warn!(target: "devnet::watcher", %tx, block = %previous.block_hash, "transaction dropped by reorg, restarting wait");
                    metrics.reorgs.increment(1);
                }
            }
        }

        if deadline.passed() {
            break
        }
        deadline.sleep(opts.poll_interval).await;
    }

    metrics.timeouts.increment(1);
    if seen {
        return Err(WaitError::timeout(format!("{confirmations} confirmations of {tx}"), opts.timeout))
    }
    Err(WaitError::NotFound { tx, after: opts.timeout })
}
