// Book Themes Error Types

use thiserror::Error;

use crate::constants::*;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Theme source file does not exist: {0}")]
    FileMissing(String),

    #[error("A book theme with this name already exists: {0}")]
    NameAlreadyInUse(String),

    #[error("Book theme {0} is in use by at least one user")]
    ThemeInUse(i64),

    #[error("Book theme {0} is provided by the system and cannot be modified")]
    SystemTheme(i64),

    #[error("Book theme not found: {0}")]
    NotFound(i64),

    #[error("Invalid theme file name: {0}")]
    InvalidFileName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("{0}")]
    Other(String),
}

impl ThemeError {
    /// Translation key for the client. Infrastructure failures share one key.
    pub fn key(&self) -> &'static str {
        match self {
            ThemeError::FileMissing(_) => ERR_FILE_MISSING,
            ThemeError::NameAlreadyInUse(_) => ERR_NAME_IN_USE,
            ThemeError::ThemeInUse(_) => ERR_THEME_IN_USE,
            ThemeError::SystemTheme(_) => ERR_SYSTEM_THEME,
            ThemeError::NotFound(_) => ERR_NOT_FOUND,
            ThemeError::InvalidFileName(_)
            | ThemeError::InvalidPath(_)
            | ThemeError::InvalidUpload(_) => ERR_INVALID_FILE,
            _ => ERR_INTERNAL,
        }
    }

    /// True for failures caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ThemeError::FileMissing(_)
                | ThemeError::NameAlreadyInUse(_)
                | ThemeError::ThemeInUse(_)
                | ThemeError::SystemTheme(_)
                | ThemeError::InvalidFileName(_)
                | ThemeError::InvalidPath(_)
                | ThemeError::InvalidUpload(_)
        )
    }
}

impl From<anyhow::Error> for ThemeError {
    fn from(err: anyhow::Error) -> Self {
        ThemeError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ThemeError>;
