//! Database library providing connectors and utilities for MongoDB and Redis
//!
//! This library provides a unified interface for connecting to and managing
//! the two backing stores of the knowledge backend: the authoritative document
//! store (MongoDB) and the response cache (Redis).
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `redis` (default) - Redis support
//! - `config` (default) - Configuration support with `core_config::FromEnv`
//! - `all` - All features
//!
//! # Examples
//!
//! ## MongoDB
//!
//! ```ignore
//! use database::mongodb;
//!
//! let client = mongodb::connect("mongodb://localhost:27017").await?;
//! let db = client.database("chat_bot");
//! let collection = db.collection::<Document>("knowledge_pairs");
//! ```
//!
//! ## Redis
//!
//! ```ignore
//! use database::redis;
//! use redis::AsyncCommands;
//!
//! let mut conn = redis::connect("redis://127.0.0.1:6379").await?;
//! conn.set::<_, _, ()>("key", "value").await?;
//! ```

// Always available modules
pub mod common;

// Database-specific modules (conditional based on features)
#[cfg(feature = "mongodb")]
pub mod mongodb;

#[cfg(feature = "redis")]
pub mod redis;

// Re-exports for convenience
pub use common::{DatabaseError, DatabaseResult};
