use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MoveError, Result};
use crate::models::LiabilitySign;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub liability_sign: LiabilitySign,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            currency: default_currency(),
            liability_sign: LiabilitySign::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("movebooks")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("movebooks")
}

/// Reads settings from `path`. A missing file yields defaults; a file that exists
/// but does not parse is an error so a typo never silently changes signs.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| MoveError::Settings(format!("{}: {e}", path.display())))
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| MoveError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}

/// Relative book paths land in the data directory; absolute ones and `./`-style
/// paths are used as given.
pub fn resolve_book_path(settings: &Settings, book: &str) -> PathBuf {
    let expanded = shellexpand_path(book);
    if expanded.is_absolute() || book.starts_with('.') || book.contains(std::path::MAIN_SEPARATOR) {
        expanded
    } else {
        shellexpand_path(&settings.data_dir).join(expanded)
    }
}
