// Database migrations
// Schema versions are tracked in PRAGMA user_version and only move forward.

use rusqlite::Connection;
use anyhow::Result;

/// Theme store schema, one SQL batch per version
const MIGRATIONS: &[&str] = &[
    // Migration 1: Book themes + system seed
    r#"
    CREATE TABLE book_themes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        normalized_name TEXT NOT NULL,
        file_name TEXT NOT NULL,
        provider INTEGER NOT NULL CHECK (provider IN (1, 2)),
        color_hash TEXT NOT NULL DEFAULT '',
        is_default INTEGER NOT NULL DEFAULT 0,
        is_dark_theme INTEGER NOT NULL DEFAULT 0,
        selector TEXT NOT NULL DEFAULT ''
    );

    CREATE UNIQUE INDEX idx_book_themes_normalized_name ON book_themes(normalized_name);
    CREATE INDEX idx_book_themes_name ON book_themes(name);

    -- System themes ship with the reader and have no managed file
    INSERT INTO book_themes (name, normalized_name, file_name, provider, color_hash, is_default, is_dark_theme, selector)
        VALUES ('Dark', 'dark', '', 1, '#010409', 1, 1, 'brtheme-dark');
    INSERT INTO book_themes (name, normalized_name, file_name, provider, color_hash, is_default, is_dark_theme, selector)
        VALUES ('White', 'white', '', 1, '#ffffff', 0, 0, 'brtheme-white');
    INSERT INTO book_themes (name, normalized_name, file_name, provider, color_hash, is_default, is_dark_theme, selector)
        VALUES ('E-Ink', 'eink', '', 1, '#ffffff', 0, 0, 'brtheme-eink');
    "#,

    // Migration 2: User reader preferences (theme link only)
    r#"
    CREATE TABLE app_user_preferences (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        app_user_id INTEGER NOT NULL UNIQUE,
        book_theme_name TEXT NOT NULL DEFAULT 'Dark'
    );

    CREATE INDEX idx_app_user_preferences_theme ON app_user_preferences(book_theme_name);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Apply every migration above the stored version, each in its own transaction
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a DB created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Database schema version {} is newer than this build supports (max {}). Please upgrade book-themes.",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        // Schema change and version bump land together or not at all
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration)?;
        tx.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;
        tx.commit()?;

        log::info!("Applied migration {}", migration_version);
    }

    Ok(())
}
