// Frameworks layer: configuration loading and runtime bootstrap.

pub mod config;
pub mod server;
