// Book theme lifecycle
// Upload ingestion, deletion, asset reconciliation and preference resolution.
//
// Metadata lives in SQLite, files live in the asset directory. There is no
// transaction spanning both, so every operation orders its steps so that a
// crash can leave an orphan file but never a record pointing at a missing file.

pub mod assets;
pub mod naming;
pub mod palette;


use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use rusqlite::Connection;
use serde::Serialize;

use crate::constants::{DEFAULT_THEME_NAME, SELECTOR_PREFIX};
use crate::db::schema::{self, BookTheme, NewBookTheme, ThemeProvider, ThemeStore};
use crate::error::{ThemeError, Result};
use assets::AssetDirectory;
use palette::{NoPalette, PaletteInspector};

/// Outcome of an asset directory sweep
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Files with no Custom theme record, now deleted
    pub removed_orphans: Vec<String>,
    /// Custom theme records whose file is missing
    pub missing_files: Vec<String>,
}

impl ReconcileReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct ThemeService {
    assets: AssetDirectory,
    palette: Box<dyn PaletteInspector>,
}

impl ThemeService {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets: AssetDirectory::new(themes_dir),
            palette: Box::new(NoPalette),
        }
    }

    pub fn with_palette_inspector(mut self, inspector: impl PaletteInspector + 'static) -> Self {
        self.palette = Box::new(inspector);
        self
    }

    pub fn assets(&self) -> &AssetDirectory {
        &self.assets
    }

    /// Create a Custom theme from a staged upload.
    ///
    /// The file at `path` is moved into the asset directory under its own name.
    /// The name check and the insert share one write transaction.
    pub fn create_book_theme_from_file(&self, conn: &Connection, path: &Path) -> Result<BookTheme> {
        if !path.is_file() {
            log::info!("Unable to create book theme, file does not exist: {}", path.display());
            return Err(ThemeError::FileMissing(path.display().to_string()));
        }

        let naked_file_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ThemeError::InvalidFileName(path.display().to_string()))?;

        let name = naming::prettify_file_name(naked_file_name);
        let normalized_name = naming::normalize(naked_file_name);
        if name.is_empty() || normalized_name.is_empty() {
            return Err(ThemeError::InvalidFileName(naked_file_name.to_string()));
        }

        let mut store = ThemeStore::begin(conn)?;
        if store.get_by_normalized_name(&normalized_name)?.is_some() {
            log::info!("Book theme name '{}' is already in use", name);
            return Err(ThemeError::NameAlreadyInUse(name));
        }

        let palette = self.palette.inspect(&fs::read(path)?);
        let file_name = self.assets.copy_into(path)?;

        if let Err(e) = fs::remove_file(path) {
            log::warn!("Failed to remove staged theme file {}: {}", path.display(), e);
        }

        let theme = NewBookTheme {
            name,
            normalized_name: normalized_name.clone(),
            file_name: file_name.clone(),
            provider: ThemeProvider::Custom,
            color_hash: palette.color_hash,
            is_default: false,
            is_dark_theme: palette.is_dark_theme,
            selector: format!("{}{}", SELECTOR_PREFIX, normalized_name),
        };
        store.add(theme.clone());

        let id = match store.commit() {
            Ok(ids) => ids
                .first()
                .copied()
                .ok_or_else(|| ThemeError::Other("Commit returned no id for new theme".to_string()))?,
            Err(e) => {
                // Undo the file placement so the failed upload leaves nothing behind
                if let Err(cleanup) = self.assets.remove(&file_name) {
                    log::warn!("Failed to remove {} after commit failure: {}", file_name, cleanup);
                }
                return Err(e);
            }
        };

        let created = theme.into_book_theme(id);
        log::info!("Book theme '{}' created (id {}, file {})", created.name, created.id, created.file_name);
        Ok(created)
    }

    /// Delete a Custom theme. Returns the removed record.
    ///
    /// Themes referenced by a user preference need `force`. System themes are never deleted.
    /// The record is committed away before the file is touched.
    pub fn delete(&self, conn: &Connection, theme_id: i64, force: bool) -> Result<BookTheme> {
        let mut store = ThemeStore::begin(conn)?;

        let theme = store.get_by_id(theme_id)?.ok_or(ThemeError::NotFound(theme_id))?;
        if theme.provider == ThemeProvider::System {
            return Err(ThemeError::SystemTheme(theme_id));
        }

        if store.is_in_use(theme_id)? {
            if !force {
                return Err(ThemeError::ThemeInUse(theme_id));
            }
            log::warn!("Force deleting book theme '{}' (id {}) while in use", theme.name, theme_id);
        }

        store.remove(&theme);
        store.commit()?;

        match self.assets.remove(&theme.file_name) {
            Ok(true) => {}
            Ok(false) => log::warn!("Book theme file {} was already missing", theme.file_name),
            Err(e) => log::warn!(
                "Book theme {} deleted but file {} could not be removed, left for reconciliation: {}",
                theme_id, theme.file_name, e
            ),
        }

        log::info!("Book theme '{}' deleted (id {})", theme.name, theme_id);
        Ok(theme)
    }

    /// Resolve a theme for serving its file. System themes have no file here.
    pub fn theme_asset_path(&self, theme: &BookTheme) -> Result<PathBuf> {
        if theme.provider == ThemeProvider::System {
            return Err(ThemeError::SystemTheme(theme.id));
        }
        self.assets.path_for(&theme.file_name)
    }

    /// Load a Custom theme and its file contents
    pub fn read_theme_file(&self, conn: &Connection, theme_id: i64) -> Result<(BookTheme, Vec<u8>)> {
        let theme = schema::get_book_theme(conn, theme_id)?.ok_or(ThemeError::NotFound(theme_id))?;
        if theme.provider == ThemeProvider::System {
            return Err(ThemeError::SystemTheme(theme_id));
        }

        let bytes = match self.assets.read(&theme.file_name) {
            Ok(bytes) => bytes,
            Err(ThemeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Book theme {} references missing file {}", theme_id, theme.file_name);
                return Err(ThemeError::NotFound(theme_id));
            }
            Err(e) => return Err(e),
        };

        Ok((theme, bytes))
    }

    /// Delete files no Custom theme references and report records whose file is gone.
    pub fn reconcile_assets(&self, conn: &Connection) -> Result<ReconcileReport> {
        let referenced: HashSet<String> = schema::list_custom_theme_file_names(conn)?
            .into_iter()
            .collect();

        let mut report = ReconcileReport::default();

        for file_name in self.assets.list_files()? {
            if referenced.contains(&file_name) {
                continue;
            }
            match self.assets.remove(&file_name) {
                Ok(_) => report.removed_orphans.push(file_name),
                Err(e) => log::warn!("Failed to remove orphan theme file {}: {}", file_name, e),
            }
        }

        let mut missing: Vec<String> = referenced
            .into_iter()
            .filter(|f| !self.assets.exists(f))
            .collect();
        missing.sort();
        for file_name in &missing {
            log::warn!("Book theme file {} is referenced but missing", file_name);
        }
        report.missing_files = missing;

        log::info!(
            "Asset reconciliation: {} orphan(s) removed, {} missing file(s)",
            report.removed_orphans.len(),
            report.missing_files.len()
        );
        Ok(report)
    }
}

/// The theme a user reads with. Preferences hold a theme name; a name that no
/// longer resolves falls back to the default theme.
pub fn resolve_user_theme(conn: &Connection, app_user_id: i64) -> Result<BookTheme> {
    if let Some(name) = schema::get_user_book_theme_name(conn, app_user_id)? {
        if let Some(theme) = schema::get_book_theme_by_normalized_name(conn, &naming::normalize(&name))? {
            return Ok(theme);
        }
        log::debug!("User {} prefers unknown theme '{}', using default", app_user_id, name);
    }
    default_book_theme(conn)
}

pub fn default_book_theme(conn: &Connection) -> Result<BookTheme> {
    if let Some(theme) = schema::get_book_theme_by_normalized_name(conn, &naming::normalize(DEFAULT_THEME_NAME))? {
        return Ok(theme);
    }

    // Listing puts default-marked themes first
    schema::list_book_themes(conn)?
        .into_iter()
        .next()
        .ok_or_else(|| ThemeError::Other("No book themes available".to_string()))
}
