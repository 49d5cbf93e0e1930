//! Configuration structs

mod bus_config;

pub use bus_config::{BusConfig, ConfigError};
