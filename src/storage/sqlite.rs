//! SQLite access to one guild archive database

use std::collections::HashMap;
use std::path::Path;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde_json::{Map, Value};
use crate::user::{ChannelCount, UserProfile, UserSummary};
use crate::{Error, Result};

/// Maximum number of rows a single channel query returns
pub const MESSAGE_LIMIT: usize = 100;

/// A message row as an ordered column -> value mapping
pub type Record = Map<String, Value>;

/// Read-only handle on a single guild database.
///
/// Opened fresh per request and dropped when the request finishes; there
/// is no pooling and no shared connection state.
pub struct GuildStore {
    conn: Connection,
}

impl GuildStore {
    /// Open a guild database read-only.
    ///
    /// The file must already exist; callers check for presence first so a
    /// missing guild surfaces as [`Error::GuildNotFound`] rather than a
    /// connection failure.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    // ========== Schema Introspection ==========

    /// All user table names in the database, in name order.
    ///
    /// SQLite's own `sqlite_*` bookkeeping tables are excluded. The
    /// aggregate `_all_messages` table is not: it lists like any channel.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(names)
    }

    /// Check whether `table` exists in this database
    fn has_table(&self, table: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    // ========== Message Operations ==========

    /// Up to [`MESSAGE_LIMIT`] rows from one channel table.
    ///
    /// The table is resolved against `sqlite_master` before any SQL is
    /// built from its name. Columns are kept in declaration order; rows
    /// come back in whatever order the storage engine scans them.
    pub fn channel_messages(&self, channel: &str) -> Result<Vec<Record>> {
        if !self.has_table(channel)? {
            return Err(Error::TableNotFound(channel.to_string()));
        }

        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_ident(channel),
            MESSAGE_LIMIT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let messages = stmt
            .query_map([], |row| {
                let mut record = Record::new();
                for (idx, column) in columns.iter().enumerate() {
                    record.insert(column.clone(), value_to_json(row.get_ref(idx)?));
                }
                Ok(record)
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(messages)
    }

    // ========== User Aggregation ==========

    /// Totals and per-channel counts for one user, from `_all_messages`.
    ///
    /// Returns [`Error::UserNotFound`] when the user has no rows there,
    /// which is distinct from the guild database itself being absent.
    pub fn user_profile(&self, user_id: &str) -> Result<UserProfile> {
        let totals = self
            .conn
            .query_row(
                "SELECT user_name, COUNT(*) AS total_messages FROM _all_messages WHERE user_id = ?1 GROUP BY user_id",
                params![user_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((user_name, total_messages)) = totals else {
            return Err(Error::UserNotFound(user_id.to_string()));
        };

        // Grouped by channel_id while projecting channel_name; the
        // ingestion bot keeps the two columns in lockstep, which is what
        // makes the projection well-defined.
        let mut stmt = self.conn.prepare(
            "SELECT channel_name, COUNT(*) AS message_count FROM _all_messages WHERE user_id = ?1 GROUP BY channel_id"
        )?;

        let channels = stmt
            .query_map(params![user_id], |row| {
                Ok(ChannelCount {
                    channel_name: row.get(0)?,
                    message_count: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(UserProfile {
            user_name,
            total_messages,
            channels,
        })
    }

    /// Message totals per user, accumulated across every table.
    ///
    /// Each introspected table is scanned with the same GROUP BY query and
    /// summed into one entry per user id. `user_name` sticks from the first
    /// table a user appears in, and the output keeps first-appearance
    /// order. `_all_messages` is scanned like any other table, so when it
    /// mirrors the channel tables these totals come out doubled.
    pub fn guild_users(&self) -> Result<Vec<UserSummary>> {
        let mut users: Vec<UserSummary> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for table in self.table_names()? {
            let sql = format!(
                "SELECT user_id, user_name, COUNT(*) AS message_count FROM {} GROUP BY user_id",
                quote_ident(&table)
            );
            let mut stmt = self.conn.prepare(&sql)?;

            let rows = stmt.query_map([], |row| {
                Ok((
                    value_to_json(row.get_ref(0)?),
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;

            for (user_id, user_name, message_count) in rows.filter_map(|r| r.ok()) {
                let key = user_id.to_string();
                match index.get(&key).copied() {
                    Some(at) => users[at].total_messages += message_count,
                    None => {
                        index.insert(key, users.len());
                        users.push(UserSummary {
                            user_id,
                            user_name,
                            total_messages: message_count,
                        });
                    }
                }
            }
        }

        Ok(users)
    }
}

/// Quote a table name for interpolation into SQL.
///
/// Table names cannot be bound as parameters; they are double-quoted with
/// embedded quotes doubled.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert one SQLite value to its JSON representation.
///
/// Blobs have no JSON equivalent and are rendered as lossy UTF-8 text.
fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Seed a guild database with two channel tables and a matching
    /// `_all_messages` aggregate, returning its path.
    fn seed_guild_db(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("testguild.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE general (
                message_id INTEGER PRIMARY KEY,
                user_id TEXT,
                user_name TEXT,
                content TEXT
            );
            CREATE TABLE random (
                message_id INTEGER PRIMARY KEY,
                user_id TEXT,
                user_name TEXT,
                content TEXT
            );
            CREATE TABLE _all_messages (
                user_id TEXT,
                user_name TEXT,
                channel_name TEXT,
                channel_id TEXT,
                content TEXT
            );

            INSERT INTO general VALUES (1, 'u1', 'alice', 'hello');
            INSERT INTO general VALUES (2, 'u1', 'alice', 'world');
            INSERT INTO general VALUES (3, 'u1', 'alice', 'again');
            INSERT INTO random VALUES (4, 'u2', 'bob', 'hi');

            INSERT INTO _all_messages VALUES ('u1', 'alice', 'general', 'c1', 'hello');
            INSERT INTO _all_messages VALUES ('u1', 'alice', 'general', 'c1', 'world');
            INSERT INTO _all_messages VALUES ('u1', 'alice', 'general', 'c1', 'again');
            INSERT INTO _all_messages VALUES ('u2', 'bob', 'random', 'c2', 'hi');
            "#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_table_names_include_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let tables = store.table_names().unwrap();
        assert_eq!(tables, vec!["_all_messages", "general", "random"]);
    }

    #[test]
    fn test_channel_messages_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let messages = store.channel_messages("general").unwrap();
        assert_eq!(messages.len(), 3);

        // Columns keep their declaration order
        let columns: Vec<&String> = messages[0].keys().collect();
        assert_eq!(columns, vec!["message_id", "user_id", "user_name", "content"]);

        assert_eq!(messages[0]["user_name"], Value::from("alice"));
        assert_eq!(messages[0]["message_id"], Value::from(1));
        assert_eq!(messages[2]["content"], Value::from("again"));
    }

    #[test]
    fn test_channel_messages_capped_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE spam (n INTEGER, user_id TEXT, user_name TEXT)")
            .unwrap();
        for n in 0..250 {
            conn.execute("INSERT INTO spam VALUES (?1, 'u1', 'alice')", params![n])
                .unwrap();
        }

        let store = GuildStore::open(&path).unwrap();
        let messages = store.channel_messages("spam").unwrap();
        assert_eq!(messages.len(), MESSAGE_LIMIT);
    }

    #[test]
    fn test_channel_messages_unknown_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let err = store.channel_messages("no-such-channel").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[test]
    fn test_user_profile_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let profile = store.user_profile("u1").unwrap();
        assert_eq!(profile.user_name, "alice");
        assert_eq!(profile.total_messages, 3);
        assert_eq!(
            profile.channels,
            vec![ChannelCount {
                channel_name: "general".to_string(),
                message_count: 3,
            }]
        );
    }

    #[test]
    fn test_user_profile_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let err = store.user_profile("nobody").unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));
    }

    #[test]
    fn test_guild_users_double_counts_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let users = store.guild_users().unwrap();
        assert_eq!(users.len(), 2);

        // Tables scan in name order, so _all_messages contributes first and
        // its counts stack on top of the per-channel tables: alice has 3
        // rows in the aggregate plus 3 in general, bob 1 plus 1.
        assert_eq!(users[0].user_id, Value::from("u1"));
        assert_eq!(users[0].user_name, "alice");
        assert_eq!(users[0].total_messages, 6);

        assert_eq!(users[1].user_id, Value::from("u2"));
        assert_eq!(users[1].user_name, "bob");
        assert_eq!(users[1].total_messages, 2);
    }

    #[test]
    fn test_guild_users_name_from_first_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renames.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE alpha (user_id TEXT, user_name TEXT);
            CREATE TABLE beta (user_id TEXT, user_name TEXT);
            INSERT INTO alpha VALUES ('u1', 'old-nick');
            INSERT INTO beta VALUES ('u1', 'new-nick');
            "#,
        )
        .unwrap();

        let store = GuildStore::open(&path).unwrap();
        let users = store.guild_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_name, "old-nick");
        assert_eq!(users[0].total_messages, 2);
    }

    #[test]
    fn test_guild_users_fails_on_table_without_user_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE metadata (key TEXT, value TEXT)")
            .unwrap();

        let store = GuildStore::open(&path).unwrap();
        let err = store.guild_users().unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_store_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuildStore::open(&seed_guild_db(&dir)).unwrap();

        let result = store.conn.execute("DELETE FROM general", []);
        assert!(result.is_err());
    }
}
