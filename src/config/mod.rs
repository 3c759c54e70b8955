mod settings;

pub use settings::{
    Company, Config, ExportSettings, GlobalConfig, OrderSettings, TableSettings, UploadSettings,
};

use crate::error::{InnoventoryError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";
pub const UPLOADS_DIR: &str = "uploads";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "innoventory")
}

/// Resolve the data directory: global config override, then XDG, then ~/.innoventory
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = load_global_config().data_dir {
        return Ok(expand_path(&dir));
    }

    if let Some(proj_dirs) = project_dirs() {
        return Ok(proj_dirs.data_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        InnoventoryError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".innoventory"))
}

/// Location of the optional global.toml
pub fn global_config_file() -> PathBuf {
    match project_dirs() {
        Some(proj_dirs) => proj_dirs.config_dir().join("global.toml"),
        None => dirs_home()
            .unwrap_or_default()
            .join(".innoventory-global.toml"),
    }
}

/// Load global.toml, falling back to defaults when missing or unreadable
pub fn load_global_config() -> GlobalConfig {
    let path = global_config_file();
    let Ok(content) = fs::read_to_string(&path) else {
        return GlobalConfig::default();
    };
    match toml::from_str(&content) {
        Ok(global) => global,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable global config");
            GlobalConfig::default()
        }
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured directory; relative paths are taken from the data dir
pub fn resolve_dir(setting: &str, data_dir: &Path) -> PathBuf {
    let expanded = expand_path(setting);
    if expanded.is_absolute() {
        expanded
    } else {
        data_dir.join(expanded)
    }
}

pub fn ensure_initialized(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        return Err(InnoventoryError::DataDirNotFound(data_dir.to_path_buf()));
    }
    Ok(())
}

/// Load the main config.toml
pub fn load_config(data_dir: &Path) -> Result<Config> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Err(InnoventoryError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let config: Config =
        toml::from_str(&content).map_err(|e| InnoventoryError::ConfigParse { path, source: e })?;
    tracing::debug!(company = %config.company.name, "loaded config");
    Ok(config)
}

/// Create the data directory layout with a template config
pub fn init_data_dir(data_dir: &Path) -> Result<()> {
    if data_dir.exists() {
        return Err(InnoventoryError::AlreadyInitialized(data_dir.to_path_buf()));
    }

    fs::create_dir_all(data_dir)?;
    fs::create_dir_all(data_dir.join(UPLOADS_DIR))?;
    fs::create_dir_all(data_dir.join("exports"))?;
    fs::write(data_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;

    tracing::info!(path = %data_dir.display(), "initialized data directory");
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "Innoventory"
# email = "admin@yourcompany.com"    # optional

[orders]
number_format = "ORD-{year}-{seq:04}"  # e.g., ORD-2026-0001
currency_symbol = "₹"

[uploads]
max_size_mb = 10
allowed_extensions = ["pdf", "png", "jpg", "jpeg", "doc", "docx", "xls", "xlsx", "csv", "txt"]

[export]
output_dir = "exports"           # relative to the data directory, or ~/path
filename_format = "{entity}_{date}"  # {entity}, {date}, {time}

[table]
page_size = 10
"#;
