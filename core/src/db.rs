use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::error::CoreError;
use crate::filter::fold_case;
use crate::migrations::MIGRATIONS;

pub struct SupportDb {
    pub path: PathBuf,
    pub conn: Connection,
}

pub fn open_support_db(path: impl AsRef<Path>) -> Result<SupportDb, CoreError> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::InvalidArgument(e.to_string()))?;
        }
    }
    let conn = Connection::open(&path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; \
         PRAGMA synchronous = NORMAL; \
         PRAGMA foreign_keys = ON; \
         PRAGMA temp_store = MEMORY;",
    )?;
    register_functions(&conn)?;
    apply_migrations(&conn)?;
    tracing::debug!(path = %path.display(), "support database opened");
    Ok(SupportDb { path, conn })
}

/// Scalar functions the ticket queries rely on. Must run on every
/// connection before listing tickets.
pub fn register_functions(conn: &Connection) -> Result<(), CoreError> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| fold_case(&t)))
        },
    )?;
    Ok(())
}

pub fn apply_migrations(conn: &Connection) -> Result<(), CoreError> {
    let stored: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let pending = MIGRATIONS
        .iter()
        .enumerate()
        .map(|(idx, sql)| (idx as i64 + 1, sql))
        .filter(|(schema_version, _)| *schema_version > stored);
    for (schema_version, sql) in pending {
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", schema_version))?;
        tracing::debug!(schema_version, "support schema migrated");
    }
    Ok(())
}
