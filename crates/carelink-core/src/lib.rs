//! # carelink-core
//!
//! Configuration shared by the Carelink API security layer.
//!
//! Every secret is referenced indirectly: the configuration file names the
//! environment variable (or file) that holds it, and [`SecurityConfig::resolve`]
//! turns those references into [`SecuritySecrets`] once, at startup.

pub mod config;

pub use config::{
    CarelinkConfig, ConfigError, SecurityConfig, SecuritySecrets, ServerConfig,
};
