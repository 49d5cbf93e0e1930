//! Error types

mod bus_error;

pub use bus_error::{BusError, BusResult};
