//! Configuration loading and root folder resolution
//!
//! The root folder holds everything agentdesk persists: the SQLite database
//! and the `uploads/` directory for profile pictures.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "agentdesk", about = "Property agency CRUD web application")]
pub struct Args {
    /// Root folder for database and uploads
    #[arg(long)]
    pub root_folder: Option<String>,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:5780")]
    pub listen: String,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub listen: String,
}

impl Config {
    /// Resolve configuration following priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. AGENTDESK_ROOT environment variable
    /// 3. TOML config file (`root_folder` key)
    /// 4. OS-dependent default data directory (fallback)
    pub fn resolve(args: &Args) -> Self {
        let root_folder = resolve_root_folder(args.root_folder.as_deref());
        Self {
            root_folder,
            listen: args.listen.clone(),
        }
    }

    /// Path to the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("agentdesk.db")
    }

    /// Directory for uploaded profile pictures
    pub fn uploads_dir(&self) -> PathBuf {
        self.root_folder.join("uploads")
    }

    /// Create the root folder and uploads directory if missing
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.uploads_dir())?;
        Ok(())
    }
}

fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("AGENTDESK_ROOT") {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = root_folder_from_config_file() {
        return path;
    }

    // Priority 4: OS-dependent default
    default_root_folder()
}

/// Read `root_folder` from ~/.config/agentdesk/config.toml if present
fn root_folder_from_config_file() -> Option<PathBuf> {
    let config_path = dirs::config_dir()?.join("agentdesk").join("config.toml");
    let toml_content = std::fs::read_to_string(&config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&toml_content).ok()?;
    config
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("agentdesk"))
        .unwrap_or_else(|| PathBuf::from("./agentdesk_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_wins_over_default() {
        let path = resolve_root_folder(Some("/tmp/agentdesk-test"));
        assert_eq!(path, PathBuf::from("/tmp/agentdesk-test"));
    }

    #[test]
    fn database_path_is_under_root() {
        let config = Config {
            root_folder: PathBuf::from("/data/agentdesk"),
            listen: "127.0.0.1:5780".to_string(),
        };
        assert_eq!(
            config.database_path(),
            PathBuf::from("/data/agentdesk/agentdesk.db")
        );
        assert_eq!(
            config.uploads_dir(),
            PathBuf::from("/data/agentdesk/uploads")
        );
    }
}
