// Theme asset directory
// One file per Custom theme, keyed by the theme's file_name.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::{FALLBACK_MIME_TYPE, MIME_TYPES, TEMP_FILE_PREFIX, THEME_EXTENSION};
use crate::error::{ThemeError, Result};
use crate::hash;

#[derive(Debug, Clone)]
pub struct AssetDirectory {
    root: PathBuf,
}

impl AssetDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored file name to its path. Rejects anything that is not a bare file name.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        if !is_bare_file_name(file_name) {
            return Err(ThemeError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.path_for(file_name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Copy a file into the directory under its own file name. Returns the stored file name.
    /// An existing file with the same name is replaced.
    pub fn copy_into(&self, source: &Path) -> Result<String> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ThemeError::InvalidPath(source.display().to_string()))?
            .to_string();

        let dest = self.path_for(&file_name)?;
        fs::create_dir_all(&self.root)?;
        copy_with_verify(source, &dest)?;

        Ok(file_name)
    }

    pub fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_for(file_name)?)?)
    }

    /// Remove a file. Returns false if it was already gone.
    pub fn remove(&self, file_name: &str) -> Result<bool> {
        let path = self.path_for(file_name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// File names currently on disk, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ThemeError::Other(format!("Failed to read asset directory: {}", e)))?;
            if entry.file_type().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    files.push(name.to_string());
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

/// MIME type for serving a theme file, from its extension
pub fn mime_type_for(file_name: &str) -> &'static str {
    let ext = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return FALLBACK_MIME_TYPE,
    };

    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// Reject upload names that are not a plain `<name>.css` before anything touches disk
pub fn validate_upload_file_name(file_name: &str) -> Result<()> {
    if !file_name.ends_with(THEME_EXTENSION) || file_name.len() == THEME_EXTENSION.len() {
        return Err(ThemeError::InvalidUpload(format!("Not a {} file: {}", THEME_EXTENSION, file_name)));
    }
    if file_name.contains("..") || !is_bare_file_name(file_name) {
        return Err(ThemeError::InvalidUpload(format!("Invalid file name: {}", file_name)));
    }
    Ok(())
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Copy through a temp file in the destination directory, verify the digest,
/// then rename into place. The final path never holds a partial file.
fn copy_with_verify(source: &Path, dest: &Path) -> Result<()> {
    let dest_dir = dest.parent().unwrap_or(Path::new("."));
    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("theme");
    let temp_path = dest_dir.join(format!("{}{}", TEMP_FILE_PREFIX, file_name));

    let source_hash = hash::compute_full_hash(source)?;
    fs::copy(source, &temp_path)?;

    let matches = match hash::verify_hash(&temp_path, &source_hash) {
        Ok(m) => m,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };
    if !matches {
        let _ = fs::remove_file(&temp_path);
        return Err(ThemeError::Hash(format!(
            "Verification failed copying {}",
            source.display()
        )));
    }

    // Preserve modification time
    if let Ok(modified) = fs::metadata(source).and_then(|m| m.modified()) {
        let _ = filetime::set_file_mtime(&temp_path, filetime::FileTime::from_system_time(modified));
    }

    if let Err(e) = fs::rename(&temp_path, dest) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_copy_into_keeps_name_and_content() {
        let tmp = TempDir::new().unwrap();
        let assets = AssetDirectory::new(tmp.path().join("themes"));
        let source = write(tmp.path(), "Ocean Breeze.css", b"body { color: teal; }");

        let stored = assets.copy_into(&source).unwrap();

        assert_eq!(stored, "Ocean Breeze.css");
        assert_eq!(assets.read(&stored).unwrap(), b"body { color: teal; }");
        assert!(source.exists(), "copy_into must not consume the source");
    }

    #[test]
    fn test_copy_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let assets = AssetDirectory::new(tmp.path().join("themes"));
        let source = write(tmp.path(), "forest.css", b"p { margin: 0; }");

        assets.copy_into(&source).unwrap();

        let files = assets.list_files().unwrap();
        assert_eq!(files, vec!["forest.css".to_string()]);
        assert!(files.iter().all(|f| !f.starts_with(TEMP_FILE_PREFIX)));
    }

    #[test]
    fn test_copy_missing_source_fails_without_placing_file() {
        let tmp = TempDir::new().unwrap();
        let assets = AssetDirectory::new(tmp.path().join("themes"));

        let result = assets.copy_into(&tmp.path().join("ghost.css"));

        assert!(result.is_err());
        assert!(assets.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_remove_reports_absence() {
        let tmp = TempDir::new().unwrap();
        let assets = AssetDirectory::new(tmp.path());
        write(tmp.path(), "gone.css", b"x");

        assert!(assets.remove("gone.css").unwrap());
        assert!(!assets.remove("gone.css").unwrap());
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let assets = AssetDirectory::new("/srv/themes");
        assert!(assets.path_for("../etc/passwd").is_err());
        assert!(assets.path_for("..").is_err());
        assert!(assets.path_for("a\\b.css").is_err());
        assert!(assets.path_for("").is_err());
        assert_eq!(assets.path_for("ok.css").unwrap(), PathBuf::from("/srv/themes/ok.css"));
    }

    #[test]
    fn test_validate_upload_file_name() {
        assert!(validate_upload_file_name("Ocean Breeze.css").is_ok());
        assert!(validate_upload_file_name("theme.scss").is_err());
        assert!(validate_upload_file_name("theme.CSS").is_err());
        assert!(validate_upload_file_name(".css").is_err());
        assert!(validate_upload_file_name("..evil.css").is_err());
        assert!(validate_upload_file_name("../evil.css").is_err());
        assert!(validate_upload_file_name("dir/evil.css").is_err());
        assert!(validate_upload_file_name("dir\\evil.css").is_err());
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for("theme.css"), "text/css");
        assert_eq!(mime_type_for("THEME.CSS"), "text/css");
        assert_eq!(mime_type_for("theme.scss"), FALLBACK_MIME_TYPE);
        assert_eq!(mime_type_for("noext"), FALLBACK_MIME_TYPE);
        assert_eq!(mime_type_for("blob.bin"), FALLBACK_MIME_TYPE);
    }
}
