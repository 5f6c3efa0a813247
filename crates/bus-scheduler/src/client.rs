use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;

use crate::completion::{CompletionSignal, ReadBuffer, TransferResult};
use crate::error::BusError;
use crate::queue::TransactionQueue;
use crate::transaction::Transaction;

/// Submit-and-wait access to the queue for one task.
///
/// Pairs the shared queue with a completion signal owned by the calling task.
/// Each call enqueues a single transaction and suspends until it completes.
pub struct BusClient<'q, 'a, M: RawMutex, const N: usize> {
    queue: &'q TransactionQueue<'a, M, N>,
    done: &'a CompletionSignal<M>,
    enqueue_timeout: Option<Duration>,
}

impl<'q, 'a, M: RawMutex, const N: usize> BusClient<'q, 'a, M, N> {
    pub fn new(
        queue: &'q TransactionQueue<'a, M, N>,
        done: &'a CompletionSignal<M>,
    ) -> Self {
        Self { queue, done, enqueue_timeout: None }
    }

    /// Bound the wait for the queue lock on every submission.
    pub fn with_enqueue_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    /// Write `bytes` to the device at `address`.
    pub async fn write(&self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        let transaction = Transaction::write(address, bytes, self.done)?;
        self.submit(transaction).await.map(|_| ())
    }

    /// Write `bytes`, then read `read_len` bytes back.
    pub async fn write_read(
        &self,
        address: u8,
        bytes: &[u8],
        read_len: usize,
    ) -> Result<ReadBuffer, BusError> {
        let transaction =
            Transaction::write_read(address, bytes, read_len, self.done)?;
        self.submit(transaction).await
    }

    /// Read `read_len` bytes from the device at `address`.
    pub async fn read(
        &self,
        address: u8,
        read_len: usize,
    ) -> Result<ReadBuffer, BusError> {
        let transaction = Transaction::read(address, read_len, self.done)?;
        self.submit(transaction).await
    }

    /// Enqueue `transaction` and wait for its result.
    ///
    /// The transaction should carry this client's completion signal;
    /// otherwise the wait never ends.
    pub async fn submit(&self, transaction: Transaction<'a, M>) -> TransferResult {
        self.done.reset();
        self.queue.enqueue(transaction, self.enqueue_timeout).await?;
        self.done.wait().await
    }
}
