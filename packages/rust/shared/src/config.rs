//! Application configuration for Darkmatter.
//!
//! User config lives at `~/.darkmatter/darkmatter.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DarkmatterError, Result};
use crate::types::{BuilderOptions, Lifecycle};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "darkmatter.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".darkmatter";

// ---------------------------------------------------------------------------
// Config structs (matching darkmatter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Registered builders, in execution order within each stage.
    #[serde(default = "default_builders")]
    pub builders: Vec<BuilderEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            builders: default_builders(),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Reading speed used for the time-to-read estimate.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,

    /// Deepest heading level included in the table of contents.
    #[serde(default = "default_toc_max_depth")]
    pub toc_max_depth: u8,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
            toc_max_depth: default_toc_max_depth(),
        }
    }
}

fn default_words_per_minute() -> u32 {
    200
}
fn default_toc_max_depth() -> u8 {
    3
}

/// `[[builders]]` entry — a stock builder registered for a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderEntry {
    /// Name of the stock builder (e.g. `frontmatter`, `toc`).
    pub name: String,

    /// Stage override; the builder's own default stage is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,

    /// Static options handed to the builder on every invocation.
    #[serde(default, skip_serializing_if = "BuilderOptions::is_empty")]
    pub options: BuilderOptions,
}

impl BuilderEntry {
    /// An entry using the builder's default stage and no options.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifecycle: None,
            options: BuilderOptions::new(),
        }
    }
}

fn default_builders() -> Vec<BuilderEntry> {
    [
        "frontmatter",
        "normalize_headings",
        "clean_blank_lines",
        "ensure_trailing_newline",
        "darkmatter",
        "toc",
    ]
    .into_iter()
    .map(BuilderEntry::named)
    .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.darkmatter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DarkmatterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.darkmatter/darkmatter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DarkmatterError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DarkmatterError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DarkmatterError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DarkmatterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DarkmatterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
