// Public theme shape returned to clients

use serde::{Deserialize, Serialize};

use crate::db::schema::{BookTheme, ThemeProvider};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookThemeDto {
    pub id: i64,
    pub name: String,
    pub color_hash: String,
    pub selector: String,
    pub is_dark_theme: bool,
    pub is_default: bool,
    pub provider: ThemeProvider,
    pub file_name: String,
}

impl From<BookTheme> for BookThemeDto {
    fn from(theme: BookTheme) -> Self {
        Self {
            id: theme.id,
            name: theme.name,
            color_hash: theme.color_hash,
            selector: theme.selector,
            is_dark_theme: theme.is_dark_theme,
            is_default: theme.is_default,
            provider: theme.provider,
            file_name: theme.file_name,
        }
    }
}
