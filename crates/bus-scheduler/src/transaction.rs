use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::completion::CompletionSignal;
use crate::config::{MAX_READ_LEN, MAX_WRITE_LEN};
use crate::error::BusError;

/// One bus operation: an optional write followed by an optional read.
///
/// A transaction is moved into the [`TransactionQueue`](crate::TransactionQueue)
/// and consumed exactly once by the driver task. Its outcome, including the
/// bytes read back, is delivered through `completion`.
pub struct Transaction<'a, M: RawMutex> {
    /// 7-bit target device address.
    pub address: u8,
    /// Bytes written to the device before reading.
    pub write: Vec<u8, MAX_WRITE_LEN>,
    /// Number of bytes to read after the write.
    pub read_len: usize,
    /// Where the result is delivered. Transactions without one are rejected.
    pub completion: Option<&'a CompletionSignal<M>>,
}

impl<'a, M: RawMutex> Transaction<'a, M> {
    /// An empty transaction for `address`. Fill in `write`/`read_len` before
    /// submitting it.
    pub fn new(address: u8, completion: &'a CompletionSignal<M>) -> Self {
        Self {
            address,
            write: Vec::new(),
            read_len: 0,
            completion: Some(completion),
        }
    }

    /// A write-only transaction.
    pub fn write(
        address: u8,
        bytes: &[u8],
        completion: &'a CompletionSignal<M>,
    ) -> Result<Self, BusError> {
        Self::write_read(address, bytes, 0, completion)
    }

    /// A write (usually a register pointer) followed by a read of `read_len` bytes.
    pub fn write_read(
        address: u8,
        bytes: &[u8],
        read_len: usize,
        completion: &'a CompletionSignal<M>,
    ) -> Result<Self, BusError> {
        let mut transaction = Self::new(address, completion);
        transaction.write =
            Vec::from_slice(bytes).map_err(|_| BusError::InvalidParameter)?;
        transaction.read_len = read_len;
        transaction.validate()?;
        Ok(transaction)
    }

    /// A read-only transaction.
    pub fn read(
        address: u8,
        read_len: usize,
        completion: &'a CompletionSignal<M>,
    ) -> Result<Self, BusError> {
        Self::write_read(address, &[], read_len, completion)
    }

    /// Check that the transaction can be executed and return its completion
    /// handle.
    pub fn validate(&self) -> Result<&'a CompletionSignal<M>, BusError> {
        let completion = self.completion.ok_or(BusError::InvalidParameter)?;
        if self.write.is_empty() && self.read_len == 0 {
            return Err(BusError::InvalidParameter);
        }
        if self.read_len > MAX_READ_LEN {
            return Err(BusError::InvalidParameter);
        }
        Ok(completion)
    }
}
