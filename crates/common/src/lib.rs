//! PI Scout Common Library
//!
//! Shared code for the discovery engine including:
//! - Graph store models and repository
//! - Academic data gateway (rate limiting, circuit breaker, providers)
//! - Identity resolution
//! - Text utilities (relevance, normalization, research vectors)
//! - Error types and handling
//! - Configuration management
//! - Metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod identity;
pub mod metrics;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{GraphStore, PiRecord};
pub use errors::{AppError, Result};
pub use gateway::AcademicGateway;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
