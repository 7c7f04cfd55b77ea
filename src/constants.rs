// Book Themes Constants
// Changing any of these affects stored data or the public API. Update migrations and clients together.

// Paths
pub const DB_FILENAME: &str = "themes.db";
pub const TEMP_FOLDER: &str = "temp";
pub const THEMES_FOLDER: &str = "themes";
pub const TEMP_FILE_PREFIX: &str = ".bookthemes_tmp_";

// Project identity for directories::ProjectDirs
pub const APP_QUALIFIER: &str = "org";
pub const APP_ORGANIZATION: &str = "bookthemes";
pub const APP_NAME: &str = "book-themes";

// Server defaults
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5050";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024; // 2MB
pub const API_BASE_PATH: &str = "/api/book-theme";

// Theme assets
pub const THEME_EXTENSION: &str = ".css";
pub const SELECTOR_PREFIX: &str = "brtheme-";
pub const DEFAULT_THEME_NAME: &str = "Dark";

// Hashing (copy verification)
pub const HASH_CHUNK_SIZE: usize = 65_536; // 64KB

// Roles
pub const ADMIN_ROLE: &str = "Admin";

// Caller identity headers (set by the upstream auth layer)
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

// Error translation keys returned to clients
pub const ERR_FILE_MISSING: &str = "errors.book-theme-file-missing";
pub const ERR_NAME_IN_USE: &str = "errors.book-theme-already-in-use";
pub const ERR_THEME_IN_USE: &str = "errors.book-theme-in-use";
pub const ERR_SYSTEM_THEME: &str = "errors.book-theme-system";
pub const ERR_NOT_FOUND: &str = "errors.book-theme-not-found";
pub const ERR_INVALID_FILE: &str = "errors.book-theme-invalid-file";
pub const ERR_UNAUTHORIZED: &str = "errors.unauthorized";
pub const ERR_INTERNAL: &str = "errors.internal";

// Extension -> MIME type for serving theme assets
pub const MIME_TYPES: [(&str, &str); 1] = [
    ("css", "text/css"),
];
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";
