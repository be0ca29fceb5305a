//! Infrastructure layer: configuration I/O and artifact generation.

pub mod config;
pub mod generator;

pub use config::{validate_config, ConfigLoader};
pub use generator::{generate_all, GenerateReport};
