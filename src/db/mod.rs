// Database module

pub mod migrations;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use anyhow::Result;

use crate::constants::{DB_FILENAME, TEMP_FOLDER, THEMES_FOLDER};

/// Open or create a database at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    // Concurrent requests each hold their own connection
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Get the database path for a data directory
pub fn get_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILENAME)
}

/// Get the upload staging folder for a data directory
pub fn get_temp_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TEMP_FOLDER)
}

/// Get the theme asset folder for a data directory
pub fn get_themes_path(data_dir: &Path) -> PathBuf {
    data_dir.join(THEMES_FOLDER)
}

/// Initialize data folder structure
pub fn init_data_folders(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    std::fs::create_dir_all(get_temp_path(data_dir))?;
    std::fs::create_dir_all(get_themes_path(data_dir))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_and_open_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("data");

        init_data_folders(&data_dir).unwrap();
        assert!(get_temp_path(&data_dir).is_dir());
        assert!(get_themes_path(&data_dir).is_dir());

        let conn = open_db(&get_db_path(&data_dir)).unwrap();
        let count = schema::count_book_themes(&conn).unwrap();
        assert_eq!(count, 3, "System themes should be seeded on first open");

        // Reopening must not re-run the seed
        drop(conn);
        let conn = open_db(&get_db_path(&data_dir)).unwrap();
        assert_eq!(schema::count_book_themes(&conn).unwrap(), 3);
    }
}
