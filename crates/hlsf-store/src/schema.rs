use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    // In-memory and fresh databases legitimately fail the checkpoint.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::debug!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS glyphs (
            idx   INTEGER PRIMARY KEY,
            glyph TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS glyph_categories (
            ord       INTEGER PRIMARY KEY,
            name      TEXT NOT NULL,
            semantics TEXT NOT NULL DEFAULT '',
            start_idx INTEGER NOT NULL,
            end_idx   INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cooccurrence (
            pair  TEXT PRIMARY KEY,
            count INTEGER NOT NULL DEFAULT 0
        );
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}
