//! Guild discovery - one SQLite file per guild in a flat directory

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Filename suffix that marks a guild database
const DB_EXTENSION: &str = ".db";

/// A guild archive discovered on disk.
///
/// `db_file` is the raw filename and doubles as the guild identifier in
/// API paths; `name` is the filename with the extension stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub name: String,
    pub db_file: String,
}

/// List the guild databases in `dir`.
///
/// Scans the directory (non-recursive) for `.db` files. A missing
/// directory yields an empty list rather than an error. Entries come back
/// in filesystem enumeration order, which is platform-dependent; callers
/// must treat the result as unordered.
pub fn list_guilds(dir: &Path) -> crate::Result<Vec<Guild>> {
    let mut guilds = Vec::new();
    if !dir.exists() {
        return Ok(guilds);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(db_file) = file_name.to_str() else {
            continue;
        };
        if let Some(name) = db_file.strip_suffix(DB_EXTENSION) {
            guilds.push(Guild {
                name: name.to_string(),
                db_file: db_file.to_string(),
            });
        }
    }

    Ok(guilds)
}
