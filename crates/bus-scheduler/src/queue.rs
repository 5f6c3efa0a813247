use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::semaphore::{GreedySemaphore, Semaphore};
use embassy_time::{with_timeout, Duration};
use heapless::Deque;
use portable_atomic::{AtomicBool, Ordering};

use crate::error::BusError;
use crate::transaction::Transaction;

/// FIFO of pending bus transactions.
///
/// Any number of producers may [`enqueue`](Self::enqueue); a single
/// [`BusDriver`](crate::BusDriver) consumes entries in submission order. The
/// FIFO lock and the data-available count are separate resources so a
/// producer can never post a wakeup the consumer misses.
pub struct TransactionQueue<'a, M: RawMutex, const N: usize> {
    fifo: Mutex<M, Deque<Transaction<'a, M>, N>>,
    available: GreedySemaphore<M>,
    initialized: AtomicBool,
}

impl<'a, M: RawMutex, const N: usize> TransactionQueue<'a, M, N> {
    pub const fn new() -> Self {
        Self {
            fifo: Mutex::new(Deque::new()),
            available: GreedySemaphore::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Append a transaction to the queue.
    ///
    /// `timeout` bounds the wait for the FIFO lock; `None` waits forever.
    /// Rejected transactions leave the queue untouched.
    pub async fn enqueue(
        &self,
        transaction: Transaction<'a, M>,
        timeout: Option<Duration>,
    ) -> Result<(), BusError> {
        if !self.is_initialized() {
            return Err(BusError::NotInitialized);
        }
        transaction.validate()?;

        let mut fifo = match timeout {
            Some(timeout) => with_timeout(timeout, self.fifo.lock())
                .await
                .map_err(|_| BusError::Timeout)?,
            None => self.fifo.lock().await,
        };

        if fifo.push_back(transaction).is_err() {
            return Err(BusError::OutOfMemory);
        }
        // Raised while the lock is still held.
        self.available.release(1);

        Ok(())
    }

    /// Number of transactions waiting to be executed.
    pub async fn len(&self) -> usize {
        self.fifo.lock().await.len()
    }

    /// Returns `true` once a driver task has attached to the queue.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Marks the queue as served. Returns `false` if it already was.
    pub(crate) fn attach(&self) -> bool {
        !self.initialized.swap(true, Ordering::AcqRel)
    }

    /// Wait for data and pop the oldest entry.
    pub(crate) async fn dequeue(&self) -> Option<Transaction<'a, M>> {
        match self.available.acquire(1).await {
            Ok(permit) => {
                permit.disarm();
            }
            Err(never) => match never {},
        }
        self.fifo.lock().await.pop_front()
    }
}

impl<M: RawMutex, const N: usize> Default for TransactionQueue<'_, M, N> {
    fn default() -> Self {
        Self::new()
    }
}
