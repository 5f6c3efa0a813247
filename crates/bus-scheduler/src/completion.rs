use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::config::MAX_READ_LEN;
use crate::error::BusError;

/// Bytes read back by a completed transaction.
pub type ReadBuffer = Vec<u8, MAX_READ_LEN>;

/// Outcome written back to the submitter of a transaction.
pub type TransferResult = Result<ReadBuffer, BusError>;

/// One-shot notification a submitter waits on for its transaction's result.
///
/// The result is written before the signal is raised, so a woken waiter
/// always observes the final outcome. Signalling never blocks and is safe
/// from interrupt context.
pub struct CompletionSignal<M: RawMutex> {
    signal: Signal<M, TransferResult>,
}

impl<M: RawMutex> CompletionSignal<M> {
    pub const fn new() -> Self {
        Self { signal: Signal::new() }
    }

    pub(crate) fn complete(&self, result: TransferResult) {
        self.signal.signal(result);
    }

    /// Wait for the result of the transaction that carries this handle.
    pub async fn wait(&self) -> TransferResult {
        self.signal.wait().await
    }

    /// Take the result if the transaction already completed.
    pub fn try_take(&self) -> Option<TransferResult> {
        self.signal.try_take()
    }

    /// Returns `true` if a result is waiting to be taken.
    pub fn is_complete(&self) -> bool {
        self.signal.signaled()
    }

    /// Discard any result that has not been taken yet.
    pub fn reset(&self) {
        self.signal.reset();
    }
}

impl<M: RawMutex> Default for CompletionSignal<M> {
    fn default() -> Self {
        Self::new()
    }
}
