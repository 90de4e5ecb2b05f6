//! # Auto Gateway Core
//!
//! Core data structures and types for the Auto Gateway platform.
//!
//! This crate provides the shared building blocks for the vehicle
//! marketplace recommendation stack: domain models for listings and
//! interaction history, error handling, configuration loading, the shared
//! PostgreSQL pool, and small vector-math utilities.
//!
//! ## Modules
//!
//! - `models`: Domain models for listings, interactions, and favorites
//! - `error`: Error types and handling
//! - `config`: Configuration loading and validation
//! - `database`: Shared PostgreSQL connection pool
//! - `math`: Mathematical utilities for vector operations

pub mod config;
pub mod database;
pub mod error;
pub mod math;
pub mod models;

// Re-export commonly used types
pub use config::{load_dotenv, ConfigLoader, DatabaseConfig, ServiceConfig};
pub use database::{DatabasePool, PoolStats};
pub use error::AutoGatewayError;
pub use math::{cosine_similarity, dot_product, l2_norm, normalize_vector};
pub use models::interaction::{Favorite, Interaction, InteractionEvent, InteractionType};
pub use models::listing::Listing;

/// Result type alias for Auto Gateway operations
pub type Result<T> = std::result::Result<T, AutoGatewayError>;
