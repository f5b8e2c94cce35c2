//! Type definitions for retry configuration

mod retry_config;

pub use retry_config::*;
