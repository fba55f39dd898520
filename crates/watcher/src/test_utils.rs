//! Test utilities for the waiters.

use crate::{ReceiptFingerprint, ReceiptSource, WaitError};
use alloy_primitives::TxHash;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A scripted [`ReceiptSource`].
///
/// Each receipt lookup pops the next scripted answer, the last one is repeated forever. Each head
/// lookup returns the head and then advances it by the configured step.
#[derive(Debug, Default)]
pub struct MockReceiptSource {
    inner: Mutex<MockReceiptSourceInner>,
}

#[derive(Debug, Default)]
struct MockReceiptSourceInner {
    receipts: VecDeque<Option<ReceiptFingerprint>>,
    head: u64,
    head_step: u64,
    head_calls: usize,
    last_head: u64,
}

impl MockReceiptSource {
    /// Returns a source with the head at `head` and no receipt.
    pub fn new(head: u64) -> Self {
        Self { inner: Mutex::new(MockReceiptSourceInner { head, ..Default::default() }) }
    }

    /// Appends answers to the receipt lookups.
    pub fn push_receipts(&self, receipts: impl IntoIterator<Item = Option<ReceiptFingerprint>>) {
        self.inner.lock().receipts.extend(receipts);
    }

    /// Sets how far the head advances after every head lookup.
    pub fn set_head_step(&self, step: u64) {
        self.inner.lock().head_step = step;
    }

    /// Returns the number of head lookups.
    pub fn head_calls(&self) -> usize {
        self.inner.lock().head_calls
    }

    /// Returns the head returned by the last head lookup.
    pub fn head_at_last_call(&self) -> u64 {
        self.inner.lock().last_head
    }
}

#[async_trait::async_trait]
impl ReceiptSource for MockReceiptSource {
    async fn receipt(&self, _tx: TxHash) -> Result<Option<ReceiptFingerprint>, WaitError> {
        let mut inner = self.inner.lock();
        if inner.receipts.len() > 1 {
            return Ok(inner.receipts.pop_front().flatten())
        }
        Ok(inner.receipts.front().copied().flatten())
    }

    async fn head(&self) -> Result<u64, WaitError> {
        let mut inner = self.inner.lock();
        let head = inner.head;
        inner.head += inner.head_step;
        inner.head_calls += 1;
        inner.last_head = head;
        Ok(head)
    }
}
