//! Graph store database layer
//!
//! Provides:
//! - SeaORM entity models
//! - Schema creation for SQLite
//! - The `GraphStore` repository with merge-on-write semantics
//! - Connection pool management

pub mod models;
mod record;
mod schema;
mod store;

pub use record::{format_seed_set, parse_seed_set, PiRecord};
pub use store::{CitationObservation, GraphStore, ScoreUpdate};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "Opening graph store");

        let in_memory = config.url.contains(":memory:");
        let mut opts = ConnectOptions::new(&config.url);
        opts.connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);
        if in_memory {
            // Every SQLite memory connection is its own database.
            opts.max_connections(1).min_connections(1);
        } else {
            opts.max_connections(config.max_connections)
                .min_connections(config.min_connections);
        }

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to open {}: {}", config.url, e),
            })?;

        if !in_memory {
            conn.execute_unprepared("PRAGMA journal_mode=WAL")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to enable WAL: {}", e),
                })?;
        }

        Ok(Self { conn })
    }

    /// In-memory pool, used by tests and dry runs
    pub async fn in_memory() -> Result<Self> {
        Self::new(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..Default::default()
        })
        .await
    }

    /// Connection for reads
    pub fn read(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Connection for writes
    pub fn write(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }
}
