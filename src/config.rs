use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::book::DEFAULT_STORAGE_KEY;
use crate::import::converter::FILE_PLACEHOLDER;
use crate::import::parser::DEFAULT_PLACEHOLDER;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "agenda";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub log_level: String,
    pub import: ImportConfig,
    pub ui: UiConfig,
}

impl Config {
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

// =============================================================================
// Import Configuration
// =============================================================================

/// Settings for the document import path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Prefix for synthesized names ("Contato" -> "Contato 1", "Contato 2", ...)
    pub placeholder: String,
    /// argv for `.doc` extraction; `{file}` is replaced by the document path
    pub doc_command: Vec<String>,
    /// argv for `.docx` extraction
    pub docx_command: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            doc_command: vec!["antiword".to_string(), FILE_PLACEHOLDER.to_string()],
            docx_command: vec![
                "pandoc".to_string(),
                "-t".to_string(),
                "plain".to_string(),
                FILE_PLACEHOLDER.to_string(),
            ],
        }
    }
}

// =============================================================================
// UI Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub header: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Hex(String),
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        match Helper::deserialize(deserializer)? {
            Helper::Hex(value) => RgbColor::from_hex(&value).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid color `{value}`, expected #rrggbb"))
            }),
            Helper::Array([r, g, b]) => Ok(RgbColor { r, g, b }),
            Helper::Map { r, g, b } => Ok(RgbColor { r, g, b }),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

fn default_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_NAME))
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Load configuration. An explicit path must exist; the default path may be
/// absent, in which case built-in defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path()?, false),
    };

    if !path.exists() {
        if required {
            bail!("configuration file not found at {}", path.display());
        }
        return from_file(path, ConfigFile::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    let cfg_file =
        parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?;
    from_file(path, cfg_file)
}

fn parse(raw: &str) -> Result<ConfigFile> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse TOML")?;
    warn_unknown_keys(&value);
    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;
    Ok(cfg_file)
}

fn from_file(config_path: PathBuf, file: ConfigFile) -> Result<Config> {
    let data_dir = match file.data_dir {
        Some(dir) => {
            let expanded = expand_tilde(&dir);
            if expanded.is_relative() {
                let base = config_path.parent().unwrap_or_else(|| Path::new("."));
                base.join(expanded)
            } else {
                expanded
            }
        }
        None => default_data_dir()?,
    };

    let storage_key = file
        .storage_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

    let log_level = file
        .log_level
        .map(|level| level.trim().to_ascii_lowercase())
        .filter(|level| !level.is_empty())
        .unwrap_or_else(|| "info".to_string());

    let import: ImportConfig = file.import.into();
    if import.doc_command.is_empty() || import.docx_command.is_empty() {
        bail!("import.doc_command and import.docx_command must not be empty");
    }

    Ok(Config {
        config_path,
        data_dir,
        storage_key,
        log_level,
        import,
        ui: file.ui.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["data_dir", "storage_key", "log_level", "import", "ui"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }

    if let Some(import) = table.get("import").and_then(|v| v.as_table()) {
        let known = HashSet::from(["placeholder", "doc_command", "docx_command"]);
        for key in import.keys() {
            if !known.contains(key.as_str()) {
                eprintln!("warning: unknown import entry `{}`", key);
            }
        }
    }

    if let Some(ui) = table.get("ui").and_then(|v| v.as_table()) {
        for key in ui.keys() {
            if key != "colors" {
                eprintln!("warning: unknown ui entry `{}`", key);
            }
        }
        if let Some(colors) = ui.get("colors").and_then(|v| v.as_table()) {
            let known = HashSet::from([
                "border",
                "selection_bg",
                "selection_fg",
                "header",
                "status_fg",
                "status_bg",
            ]);
            for key in colors.keys() {
                if !known.contains(key.as_str()) {
                    eprintln!("warning: unknown ui.colors entry `{}`", key);
                }
            }
        }
    }
}

// =============================================================================
// File types
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    storage_key: Option<String>,
    log_level: Option<String>,
    import: ImportFile,
    ui: UiFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ImportFile {
    placeholder: Option<String>,
    doc_command: Option<Vec<String>>,
    docx_command: Option<Vec<String>>,
}

impl From<ImportFile> for ImportConfig {
    fn from(file: ImportFile) -> Self {
        let defaults = ImportConfig::default();
        Self {
            placeholder: file
                .placeholder
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.placeholder),
            doc_command: file.doc_command.unwrap_or(defaults.doc_command),
            docx_command: file.docx_command.unwrap_or(defaults.docx_command),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    header: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(0, 175, 135),
            selection_bg: RgbColor::new(0, 175, 135),
            selection_fg: RgbColor::new(0, 0, 0),
            header: RgbColor::new(0, 175, 135),
            status_fg: RgbColor::new(0, 175, 135),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                header: file.colors.header,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}
