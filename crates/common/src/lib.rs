//! Replenish common library
//!
//! This crate contains shared code used across the proxy and the client.

pub mod config;
pub mod error;
pub mod messages;
pub mod metrics;
pub mod secret;

// Re-export commonly used types
pub use crate::config::{CredentialSource, DeploymentEnvironment, ReplenishConfig};
pub use error::{ReplenishError, Result};
pub use messages::{Locale, Messages};
pub use metrics::{InFlightGuard, MetricsRegistry, METRICS};
pub use secret::SecretString;
