//! Configuration and error types shared by the throttlegate crates.

pub mod config;
pub mod error;

pub use config::{AppConfig, RateLimitConfig};
pub use error::{Error, Result};
