//! Configuration loading and management

mod loader;

pub use loader::{ConfigLoader, ENV_PREFIX, RETRY_CONFIG_FILE};
