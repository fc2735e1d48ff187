//! Application configuration for termgroup.
//!
//! User config lives at `~/.termgroup/termgroup.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TermGroupError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "termgroup.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".termgroup";

// ---------------------------------------------------------------------------
// Config structs (matching termgroup.toml schema)
// ---------------------------------------------------------------------------

/// Order of members within each assembled section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberOrder {
    /// Preserve the caller's original input order.
    #[default]
    Input,
    /// Sort by term identifier.
    Identifier,
}

/// Section file encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured text, one `# SECTION` block per section.
    #[default]
    Text,
    /// JSON data literal of `(name, members)` pairs.
    Literal,
}

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Grouping defaults.
    #[serde(default)]
    pub grouping: GroupingDefaults,

    /// Output defaults.
    #[serde(default)]
    pub output: OutputDefaults,
}

/// `[grouping]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingDefaults {
    /// Member ordering within sections.
    #[serde(default)]
    pub member_order: MemberOrder,

    /// Relationship types (e.g. `part_of`) traversed in addition to `is_a`.
    #[serde(default)]
    pub follow_relationships: Vec<String>,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDefaults {
    /// Encoding used when the output path does not decide it.
    #[serde(default)]
    pub format: OutputFormat,

    /// Write `[N]` member counts on text section headers.
    #[serde(default = "default_true")]
    pub member_counts: bool,

    /// Append `# <term name>` comments to text member lines.
    #[serde(default = "default_true")]
    pub annotate: bool,
}

impl Default for OutputDefaults {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            member_counts: true,
            annotate: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Grouping config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime grouping configuration — merged from config file + CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingConfig {
    /// Member ordering within sections.
    pub member_order: MemberOrder,
    /// Relationship types traversed as ancestry.
    pub follow_relationships: Vec<String>,
    /// Output encoding.
    pub format: OutputFormat,
    /// Write member counts on text headers.
    pub member_counts: bool,
    /// Annotate text member lines with term names.
    pub annotate: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for GroupingConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            member_order: config.grouping.member_order,
            follow_relationships: config.grouping.follow_relationships.clone(),
            format: config.output.format,
            member_counts: config.output.member_counts,
            annotate: config.output.annotate,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.termgroup/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TermGroupError::configuration("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.termgroup/termgroup.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| TermGroupError::storage(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TermGroupError::configuration(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TermGroupError::storage(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)
        .map_err(|e| TermGroupError::configuration(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TermGroupError::storage(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
