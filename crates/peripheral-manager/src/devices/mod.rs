//! Register maps and transactions for the sensor board peripherals.

pub mod hdc1050;
pub mod mcp9808;
pub mod tca9554a;

pub use hdc1050::{Hdc1050, Measurement};
pub use mcp9808::Mcp9808;
pub use tca9554a::Tca9554a;
