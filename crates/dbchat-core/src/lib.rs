//! dbchat-core: sales database introspection and query tooling
//!
//! This crate provides the core functionality for the dbchat sales agent:
//! runtime schema introspection of a SQLite retail database, row-limited
//! query execution with model-friendly result encoding, and the tool
//! registry offered to the language model.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod seed;
pub mod tools;

pub use config::Config;
pub use db::Database;
pub use error::Error;
pub use error::Result;
pub use schema::SchemaProvider;
pub use tools::Registry;

/// Application name used for config directories and paths.
pub const APP_NAME: &str = "dbchat";

/// Returns the environment variable prefix for this application.
pub fn env_prefix() -> String {
    "DBCHAT".to_string()
}
