// Database schema types and query helpers

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use crate::error::{ThemeError, Result};

// ----- Book Theme -----

/// Where a theme comes from. System themes ship with the reader; Custom themes are uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeProvider {
    System,
    Custom,
}

impl ThemeProvider {
    pub fn as_i64(self) -> i64 {
        match self {
            ThemeProvider::System => 1,
            ThemeProvider::Custom => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeProvider::System => "System",
            ThemeProvider::Custom => "Custom",
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(ThemeProvider::System),
            2 => Some(ThemeProvider::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTheme {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub file_name: String,
    pub provider: ThemeProvider,
    pub color_hash: String,
    pub is_default: bool,
    pub is_dark_theme: bool,
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookTheme {
    pub name: String,
    pub normalized_name: String,
    pub file_name: String,
    pub provider: ThemeProvider,
    pub color_hash: String,
    pub is_default: bool,
    pub is_dark_theme: bool,
    pub selector: String,
}

impl NewBookTheme {
    /// Attach the id assigned on commit
    pub fn into_book_theme(self, id: i64) -> BookTheme {
        BookTheme {
            id,
            name: self.name,
            normalized_name: self.normalized_name,
            file_name: self.file_name,
            provider: self.provider,
            color_hash: self.color_hash,
            is_default: self.is_default,
            is_dark_theme: self.is_dark_theme,
            selector: self.selector,
        }
    }
}

const BOOK_THEME_COLUMNS: &str =
    "id, name, normalized_name, file_name, provider, color_hash, is_default, is_dark_theme, selector";

fn map_book_theme(row: &rusqlite::Row) -> rusqlite::Result<BookTheme> {
    let provider_raw: i64 = row.get(4)?;
    let provider = ThemeProvider::from_i64(provider_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Integer,
            format!("unknown theme provider {}", provider_raw).into(),
        )
    })?;

    Ok(BookTheme {
        id: row.get(0)?,
        name: row.get(1)?,
        normalized_name: row.get(2)?,
        file_name: row.get(3)?,
        provider,
        color_hash: row.get(5)?,
        is_default: row.get(6)?,
        is_dark_theme: row.get(7)?,
        selector: row.get(8)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub fn insert_book_theme(conn: &Connection, theme: &NewBookTheme) -> Result<i64> {
    if theme.name.is_empty() || theme.normalized_name.is_empty() {
        return Err(ThemeError::InvalidFileName(theme.file_name.clone()));
    }

    conn.execute(
        "INSERT INTO book_themes (name, normalized_name, file_name, provider, color_hash, is_default, is_dark_theme, selector)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            theme.name,
            theme.normalized_name,
            theme.file_name,
            theme.provider.as_i64(),
            theme.color_hash,
            theme.is_default,
            theme.is_dark_theme,
            theme.selector,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            ThemeError::NameAlreadyInUse(theme.name.clone())
        } else {
            ThemeError::Database(e)
        }
    })?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_book_theme(conn: &Connection, id: i64) -> Result<()> {
    let rows = conn.execute("DELETE FROM book_themes WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(ThemeError::NotFound(id));
    }
    Ok(())
}

pub fn get_book_theme(conn: &Connection, id: i64) -> Result<Option<BookTheme>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM book_themes WHERE id = ?1", BOOK_THEME_COLUMNS),
        params![id],
        map_book_theme,
    ).optional()?;
    Ok(result)
}

/// Look up by canonical key. Callers normalize first (see themes::naming::normalize).
pub fn get_book_theme_by_normalized_name(conn: &Connection, normalized_name: &str) -> Result<Option<BookTheme>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM book_themes WHERE normalized_name = ?1", BOOK_THEME_COLUMNS),
        params![normalized_name],
        map_book_theme,
    ).optional()?;
    Ok(result)
}

/// All themes, default-marked first, then by id
pub fn list_book_themes(conn: &Connection) -> Result<Vec<BookTheme>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM book_themes ORDER BY is_default DESC, id ASC",
        BOOK_THEME_COLUMNS
    ))?;
    let themes = stmt
        .query_map([], map_book_theme)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(themes)
}

/// File names of every Custom theme (the set the asset directory should contain)
pub fn list_custom_theme_file_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT file_name FROM book_themes WHERE provider = ?1 ORDER BY id"
    )?;
    let names = stmt
        .query_map(params![ThemeProvider::Custom.as_i64()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

pub fn count_book_themes(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM book_themes", [], |row| row.get(0))?;
    Ok(count)
}

/// True if any user preference points at this theme.
/// Preferences store the theme's display name, so the join is on name, not id.
pub fn is_book_theme_in_use(conn: &Connection, id: i64) -> Result<bool> {
    let in_use: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM app_user_preferences p
             JOIN book_themes b ON p.book_theme_name = b.name
             WHERE b.id = ?1
         )",
        params![id],
        |row| row.get(0),
    )?;
    Ok(in_use)
}

// ----- User Preferences -----

pub fn set_user_book_theme(conn: &Connection, app_user_id: i64, book_theme_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO app_user_preferences (app_user_id, book_theme_name) VALUES (?1, ?2)
         ON CONFLICT(app_user_id) DO UPDATE SET book_theme_name = excluded.book_theme_name",
        params![app_user_id, book_theme_name],
    )?;
    Ok(())
}

pub fn get_user_book_theme_name(conn: &Connection, app_user_id: i64) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT book_theme_name FROM app_user_preferences WHERE app_user_id = ?1",
        params![app_user_id],
        |row| row.get(0),
    ).optional()?;
    Ok(result)
}

// ----- Unit of work -----

enum StagedChange {
    Add(NewBookTheme),
    Remove(i64),
}

/// Transaction boundary for theme catalog changes.
///
/// `begin` takes the SQLite write lock up front (BEGIN IMMEDIATE), so reads made through
/// the store and the staged writes form one serialized unit. Staged adds and removes
/// touch the database only in `commit`. Dropping the store without committing rolls
/// everything back.
pub struct ThemeStore<'c> {
    tx: Transaction<'c>,
    staged: Vec<StagedChange>,
}

impl<'c> ThemeStore<'c> {
    pub fn begin(conn: &'c Connection) -> Result<Self> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        Ok(Self { tx, staged: Vec::new() })
    }

    pub fn add(&mut self, theme: NewBookTheme) {
        self.staged.push(StagedChange::Add(theme));
    }

    pub fn remove(&mut self, theme: &BookTheme) {
        self.staged.push(StagedChange::Remove(theme.id));
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<BookTheme>> {
        get_book_theme(&self.tx, id)
    }

    pub fn get_by_normalized_name(&self, normalized_name: &str) -> Result<Option<BookTheme>> {
        get_book_theme_by_normalized_name(&self.tx, normalized_name)
    }

    pub fn is_in_use(&self, id: i64) -> Result<bool> {
        is_book_theme_in_use(&self.tx, id)
    }

    /// Apply staged changes and commit. Returns ids of added themes in staging order.
    pub fn commit(self) -> Result<Vec<i64>> {
        let mut ids = Vec::new();
        for change in &self.staged {
            match change {
                StagedChange::Add(theme) => ids.push(insert_book_theme(&self.tx, theme)?),
                StagedChange::Remove(id) => delete_book_theme(&self.tx, *id)?,
            }
        }
        self.tx.commit()?;
        Ok(ids)
    }
}
