// Book Themes CLI binary

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use anyhow::Result;
use uuid::Uuid;

use book_themes_lib::config::{default_data_dir, init_logging, ServerConfig};
use book_themes_lib::db::{init_data_folders, open_db};
use book_themes_lib::db::schema::{self, BookTheme};
use book_themes_lib::themes::{self, assets::validate_upload_file_name, naming, ThemeService};

#[derive(Parser)]
#[command(name = "bookthemes")]
#[command(about = "Book Themes - manage reader themes from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "BOOK_THEMES_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: debug, info, warn, error
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database
    Init,

    /// List all themes
    List,

    /// Show theme details
    Show {
        /// Theme ID
        id: i64,
    },

    /// Upload a .css file as a new custom theme
    Upload {
        /// Path to the stylesheet
        path: PathBuf,
    },

    /// Delete a custom theme
    Delete {
        /// Theme ID
        id: i64,
        /// Delete even if users have it selected
        #[arg(long)]
        force: bool,
    },

    /// Remove orphaned theme files and report themes with missing files
    Reconcile {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or set a user's theme
    Prefs {
        /// User ID
        user_id: i64,
        /// Theme name to select
        theme: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let config = ServerConfig::new(data_dir);

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::List => cmd_list(&config),
        Commands::Show { id } => cmd_show(&config, id),
        Commands::Upload { path } => cmd_upload(&config, path),
        Commands::Delete { id, force } => cmd_delete(&config, id, force),
        Commands::Reconcile { json } => cmd_reconcile(&config, json),
        Commands::Prefs { user_id, theme } => cmd_prefs(&config, user_id, theme),
    }
}

fn connect(config: &ServerConfig) -> Result<rusqlite::Connection> {
    let db_path = config.db_path();
    if !db_path.exists() {
        anyhow::bail!(
            "No theme database at {}. Run 'bookthemes init' first.",
            config.data_dir.display()
        );
    }
    open_db(&db_path)
}

fn cmd_init(config: &ServerConfig) -> Result<()> {
    let db_path = config.db_path();
    if db_path.exists() {
        anyhow::bail!("Theme database already exists at {}", config.data_dir.display());
    }

    init_data_folders(&config.data_dir)?;
    let conn = open_db(&db_path)?;
    let count = schema::count_book_themes(&conn)?;

    println!("Initialized theme store at {}", config.data_dir.display());
    println!("Structure created:");
    println!("  themes.db   - Database ({} system themes)", count);
    println!("  themes/     - Custom theme files");
    println!("  temp/       - Upload staging");

    Ok(())
}

fn cmd_list(config: &ServerConfig) -> Result<()> {
    let conn = connect(config)?;
    let themes = schema::list_book_themes(&conn)?;

    println!("{:>5}  {:>8}  {:>7}  {:<24}  {}", "ID", "Provider", "Default", "Name", "Selector");
    println!("{}", "-".repeat(70));

    for theme in &themes {
        println!("{:>5}  {:>8}  {:>7}  {:<24}  {}",
            theme.id,
            theme.provider.as_str(),
            if theme.is_default { "yes" } else { "" },
            truncate(&theme.name, 24),
            theme.selector,
        );
    }

    println!();
    println!("{} themes", themes.len());
    Ok(())
}

fn cmd_show(config: &ServerConfig, id: i64) -> Result<()> {
    let conn = connect(config)?;
    let theme = schema::get_book_theme(&conn, id)?
        .ok_or_else(|| anyhow::anyhow!("Theme {} not found", id))?;

    print_theme(&theme);

    let service = ThemeService::new(config.themes_dir());
    if let Ok(path) = service.theme_asset_path(&theme) {
        println!();
        println!("File:");
        println!("  Path:      {}", path.display());
        match std::fs::metadata(&path) {
            Ok(meta) => println!("  Size:      {} bytes", meta.len()),
            Err(_) => println!("  Status:    MISSING"),
        }
    }

    println!();
    println!("In use:      {}", if schema::is_book_theme_in_use(&conn, id)? { "yes" } else { "no" });
    Ok(())
}

fn cmd_upload(config: &ServerConfig, path: PathBuf) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file path: {}", path.display()))?
        .to_string();
    validate_upload_file_name(&file_name)?;

    let conn = connect(config)?;
    let service = ThemeService::new(config.themes_dir());

    // Stage a copy; the service consumes the staged file
    let staging_dir = config.temp_dir().join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&staging_dir)?;
    let staged_path = staging_dir.join(&file_name);

    let result = std::fs::copy(&path, &staged_path)
        .map_err(anyhow::Error::from)
        .and_then(|_| Ok(service.create_book_theme_from_file(&conn, &staged_path)?));

    if let Err(e) = std::fs::remove_dir_all(&staging_dir) {
        log::warn!("Failed to clean upload staging {}: {}", staging_dir.display(), e);
    }

    let theme = result?;
    println!("Created theme #{} '{}'", theme.id, theme.name);
    println!("  Selector:  {}", theme.selector);
    Ok(())
}

fn cmd_delete(config: &ServerConfig, id: i64, force: bool) -> Result<()> {
    let conn = connect(config)?;
    let service = ThemeService::new(config.themes_dir());

    let theme = service.delete(&conn, id, force)?;
    println!("Deleted theme #{} '{}'", theme.id, theme.name);
    Ok(())
}

fn cmd_reconcile(config: &ServerConfig, json: bool) -> Result<()> {
    let conn = connect(config)?;
    let service = ThemeService::new(config.themes_dir());

    let report = service.reconcile_assets(&conn)?;
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("Reconcile complete:");
    println!("  Orphans removed:  {}", report.removed_orphans.len());
    for name in &report.removed_orphans {
        println!("    {}", name);
    }
    println!("  Missing files:    {}", report.missing_files.len());
    for name in &report.missing_files {
        println!("    {}", name);
    }
    Ok(())
}

fn cmd_prefs(config: &ServerConfig, user_id: i64, theme: Option<String>) -> Result<()> {
    let conn = connect(config)?;

    if let Some(requested) = theme {
        let target = schema::get_book_theme_by_normalized_name(&conn, &naming::normalize(&requested))?
            .ok_or_else(|| anyhow::anyhow!("No theme named '{}'", requested))?;
        schema::set_user_book_theme(&conn, user_id, &target.name)?;
        println!("User {} now uses '{}'", user_id, target.name);
        return Ok(());
    }

    let stored = schema::get_user_book_theme_name(&conn, user_id)?;
    let resolved = themes::resolve_user_theme(&conn, user_id)?;

    match stored {
        Some(name) if naming::normalize(&name) == resolved.normalized_name => println!("User {} uses '{}'", user_id, name),
        Some(name) => println!(
            "User {} selected '{}' (no longer exists), falls back to '{}'",
            user_id, name, resolved.name
        ),
        None => println!("User {} has no preference, uses default '{}'", user_id, resolved.name),
    }
    Ok(())
}

fn print_theme(theme: &BookTheme) {
    println!("Theme #{}", theme.id);
    println!();
    println!("Name:        {}", theme.name);
    println!("Normalized:  {}", theme.normalized_name);
    println!("Provider:    {}", theme.provider.as_str());
    println!("Selector:    {}", theme.selector);
    println!("Default:     {}", theme.is_default);
    println!("Dark:        {}", theme.is_dark_theme);
    if !theme.color_hash.is_empty() {
        println!("Color:       {}", theme.color_hash);
    }
    println!("File name:   {}", theme.file_name);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
