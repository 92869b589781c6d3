//! Storage Layer - read-only SQLite access
//!
//! Each guild database is written by the ingestion bot with:
//! - one table per channel, named after the channel, arbitrary columns
//! - `_all_messages`(user_id, user_name, channel_name, channel_id, ...)
//!
//! Nothing here creates, migrates, or writes; tables are discovered at
//! runtime through schema introspection.

pub mod sqlite;

pub use sqlite::{GuildStore, Record, MESSAGE_LIMIT};
