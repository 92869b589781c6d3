//! User aggregation types
//!
//! These records are shaped directly by the aggregate SQL that produces
//! them; `user_id` stays an opaque JSON value since channel tables decide
//! its type, not this service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user's message total across one guild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: Value,
    pub user_name: String,
    pub total_messages: i64,
}

/// One channel's share of a user's messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCount {
    pub channel_name: String,
    pub message_count: i64,
}

/// Aggregated profile for a single user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_name: String,
    pub total_messages: i64,
    pub channels: Vec<ChannelCount>,
}
