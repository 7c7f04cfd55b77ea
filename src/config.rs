// Server configuration and logging setup

use std::net::SocketAddr;
use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

use crate::constants::*;
use crate::db;

/// Command-line and environment configuration for the server binary
#[derive(Parser, Debug, Clone)]
#[command(name = "book-themes")]
#[command(about = "Book Themes - theme asset service for the e-book reader", long_about = None)]
#[command(version)]
pub struct ServerArgs {
    /// Data directory (database, upload staging, theme files)
    #[arg(long, env = "BOOK_THEMES_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "BOOK_THEMES_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// Largest accepted upload request in bytes
    #[arg(long, env = "BOOK_THEMES_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Log level: debug, info, warn, error. RUST_LOG overrides it when set.
    #[arg(long, env = "BOOK_THEMES_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn from_args(args: &ServerArgs) -> Result<Self> {
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        if args.max_upload_bytes == 0 {
            anyhow::bail!("max upload size must be greater than zero");
        }

        Ok(Self {
            data_dir,
            max_upload_bytes: args.max_upload_bytes,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        db::get_db_path(&self.data_dir)
    }

    pub fn temp_dir(&self) -> PathBuf {
        db::get_temp_path(&self.data_dir)
    }

    pub fn themes_dir(&self) -> PathBuf {
        db::get_themes_path(&self.data_dir)
    }
}

/// Platform data directory, e.g. ~/.local/share/book-themes on Linux
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Accepts: "debug", "info", "warn", "error"
pub fn parse_log_level(level: &str) -> Option<log::LevelFilter> {
    match level.to_lowercase().as_str() {
        "debug" => Some(log::LevelFilter::Debug),
        "info" => Some(log::LevelFilter::Info),
        "warn" => Some(log::LevelFilter::Warn),
        "error" => Some(log::LevelFilter::Error),
        _ => None,
    }
}

/// Install the env_logger backend. Safe to call more than once.
pub fn init_logging(level: &str) {
    let filter = parse_log_level(level).unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_env("RUST_LOG")
        .try_init();
}
