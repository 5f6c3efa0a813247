#![no_std]
//! Asynchronous bus-transaction scheduler.
//!
//! Serialises access to a shared peripheral bus (I2C on the smart bandage)
//! between any number of tasks. Producers submit [`Transaction`]s to a
//! [`TransactionQueue`]; a single [`BusDriver`] executes them one at a time
//! against the [`BusHardwareDriver`] and reports each outcome through the
//! transaction's [`CompletionSignal`]. A watchdog aborts transfers that never
//! complete, so a wedged bus cannot stall the queue.

mod client;
mod completion;
mod config;
mod driver;
mod error;
mod hardware;
mod port;
mod queue;
mod transaction;

pub use client::BusClient;
pub use completion::{CompletionSignal, ReadBuffer, TransferResult};
pub use config::{
    SchedulerConfig, DEFAULT_TRANSFER_TIMEOUT, MAX_READ_LEN, MAX_WRITE_LEN,
};
pub use driver::BusDriver;
pub use error::BusError;
pub use hardware::BusHardwareDriver;
pub use port::{Ticket, TransferPort};
pub use queue::TransactionQueue;
pub use transaction::Transaction;
