//! # Guildhall - Guild Message Archive API
//!
//! Read-only HTTP query service over a directory of per-guild SQLite
//! message archives.
//!
//! Guildhall provides:
//! - Guild database discovery from a local directory
//! - Channel (table) listing via schema introspection
//! - Recent-message retrieval per channel, rows as ordered mappings
//! - User summaries and per-user profiles aggregated in SQL

pub mod config;
pub mod guild;
pub mod user;
pub mod storage;
pub mod server;

// Re-exports for convenient access
pub use guild::Guild;
pub use user::{ChannelCount, UserProfile, UserSummary};
pub use storage::GuildStore;

/// Result type alias for Guildhall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Guildhall operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Guild database not found: {0}")]
    GuildNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("No such channel table: {0}")]
    TableNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
