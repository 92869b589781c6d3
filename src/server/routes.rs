use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::guild::{self, Guild};
use crate::server::AppState;
use crate::storage::{GuildStore, Record};
use crate::user::{UserProfile, UserSummary};
use crate::Error;

/// One channel (table) in a guild database
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Boundary adapter between library errors and HTTP responses.
///
/// Two classes only: missing guild database or missing user map to 404
/// with their fixed messages; everything else maps to 500 with the
/// endpoint's fixed message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn from_error(err: Error, fallback: &str) -> Self {
        match err {
            Error::GuildNotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: "Guild database not found".to_string(),
            },
            Error::UserNotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: "User not found".to_string(),
            },
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: fallback.to_string(),
            },
        }
    }

    /// Same mapping as [`ApiError::from_error`], with the underlying error
    /// text appended to the 500 message.
    fn from_error_detailed(err: Error, fallback: &str) -> Self {
        match err {
            Error::GuildNotFound(_) | Error::UserNotFound(_) => Self::from_error(err, fallback),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("{}: {}", fallback, other),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Resolve a guild database path and open it.
///
/// A missing file becomes [`Error::GuildNotFound`] before any connection
/// is attempted; connection failures on an existing file stay in the
/// server-error class.
fn open_guild(state: &AppState, guild_db: &str) -> crate::Result<GuildStore> {
    let db_path = state.database_dir.join(guild_db);
    if !db_path.exists() {
        return Err(Error::GuildNotFound(guild_db.to_string()));
    }
    GuildStore::open(&db_path)
}

pub async fn list_guilds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Guild>>, ApiError> {
    let guilds = guild::list_guilds(&state.database_dir).map_err(|e| {
        tracing::error!("Failed to list guild databases in {:?}: {}", state.database_dir, e);
        ApiError::from_error(e, "Could not retrieve guilds")
    })?;

    Ok(Json(guilds))
}

pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Path(guild_db): Path<String>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    let tables = open_guild(&state, &guild_db)
        .and_then(|store| store.table_names())
        .map_err(|e| {
            tracing::error!("Failed to list channels for {}: {}", guild_db, e);
            ApiError::from_error(e, "Could not retrieve channels")
        })?;

    Ok(Json(tables.into_iter().map(|name| Channel { name }).collect()))
}

pub async fn channel_messages(
    State(state): State<Arc<AppState>>,
    Path((guild_db, channel_name)): Path<(String, String)>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let messages = open_guild(&state, &guild_db)
        .and_then(|store| store.channel_messages(&channel_name))
        .map_err(|e| {
            tracing::error!("Failed to fetch messages from {}/{}: {}", guild_db, channel_name, e);
            ApiError::from_error(e, "Could not retrieve messages")
        })?;

    Ok(Json(messages))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Path(guild_db): Path<String>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = open_guild(&state, &guild_db)
        .and_then(|store| store.guild_users())
        .map_err(|e| {
            tracing::error!("Failed to aggregate users for {}: {}", guild_db, e);
            ApiError::from_error_detailed(e, "Could not retrieve users")
        })?;

    Ok(Json(users))
}

pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    Path((guild_db, user_id)): Path<(String, String)>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = open_guild(&state, &guild_db)
        .and_then(|store| store.user_profile(&user_id))
        .map_err(|e| {
            tracing::error!("Failed to fetch profile for {} in {}: {}", user_id, guild_db, e);
            ApiError::from_error(e, "Could not retrieve user profile")
        })?;

    Ok(Json(profile))
}
