//! Configuration management for sheetslip

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetslipError};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report content and layout
    #[serde(default)]
    pub report: ReportConfig,

    /// Font lookup
    #[serde(default)]
    pub fonts: FontConfig,

    /// Persian/Arabic text shaping
    #[serde(default)]
    pub shaping: ShapingConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output directory
    pub output_dir: PathBuf,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    /// Automatically accept prompts
    pub auto_yes: bool,
    /// Open the output directory after a successful conversion
    pub open_output: bool,
}

/// Report configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Column holding the employee name
    pub name_column: String,
    /// Worksheet to read (first sheet when unset)
    pub sheet: Option<String>,
    /// Title printed before the employee name
    pub title: String,
    /// Label printed before the generation timestamp
    pub date_label: String,
    /// chrono format of the generation timestamp
    pub timestamp_format: String,
    /// Text printed for empty cells
    pub missing_value: String,
    /// Sheets with more columns than this use the vertical layout
    pub vertical_threshold: usize,
}

/// Font configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Explicit font file, skipping the search
    pub path: Option<PathBuf>,
    /// Font file names tried in order
    pub names: Vec<String>,
    /// Directories searched for each name
    pub search_dirs: Vec<PathBuf>,
}

/// Text shaping configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    /// Reshape and reorder right-to-left text
    pub enabled: bool,
    /// Drop harakat (short vowel marks)
    pub delete_harakat: bool,
    /// Use lam-alef ligatures
    pub support_ligatures: bool,
    /// Replace the word ریال with the rial sign
    pub rial_sign: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub color: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output_pdfs"),
            jobs: None,
            auto_yes: false,
            open_output: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name_column: "نام".to_string(),
            sheet: None,
            title: "گزارش اطلاعات".to_string(),
            date_label: "تاریخ تولید گزارش".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
            missing_value: "-".to_string(),
            vertical_threshold: 10,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        let names = [
            "Vazir.ttf",
            "Vazir-Regular.ttf",
            "Vazir-Medium.ttf",
            "Vazir-Bold.ttf",
            "Sahel.ttf",
            "B-Nazanin.ttf",
            "IRANSans.ttf",
        ];

        let mut search_dirs = vec![
            PathBuf::new(),
            PathBuf::from("fonts"),
            PathBuf::from("/usr/share/fonts/truetype"),
            PathBuf::from("C:/Windows/Fonts"),
        ];
        if let Some(home) = dirs::home_dir() {
            search_dirs.push(home.join(".fonts"));
        }
        search_dirs.push(PathBuf::from("/System/Library/Fonts"));
        if let Some(font_dir) = dirs::font_dir() {
            if !search_dirs.contains(&font_dir) {
                search_dirs.push(font_dir);
            }
        }

        Self {
            path: None,
            names: names.iter().map(|n| n.to_string()).collect(),
            search_dirs,
        }
    }
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delete_harakat: false,
            support_ligatures: true,
            rial_sign: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SheetslipError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("sheetslip").join("config.toml"))
    }

    /// Resolve an explicit path or fall back to the default location
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::config_path(),
        }
    }

    /// Load configuration from a file, using defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(path: &Path) -> Result<()> {
        Self::default().save_to(path)
    }

    /// Initialize configuration file
    pub fn init(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(SheetslipError::Config(
                "Configuration file already exists. Use --force to overwrite.".into()
            ));
        }

        Self::default().save_to(path)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "general.output_dir" => Some(self.general.output_dir.display().to_string()),
            "general.jobs" => self.general.jobs.map(|j| j.to_string()),
            "general.auto_yes" => Some(self.general.auto_yes.to_string()),
            "general.open_output" => Some(self.general.open_output.to_string()),

            "report.name_column" => Some(self.report.name_column.clone()),
            "report.sheet" => self.report.sheet.clone(),
            "report.title" => Some(self.report.title.clone()),
            "report.date_label" => Some(self.report.date_label.clone()),
            "report.timestamp_format" => Some(self.report.timestamp_format.clone()),
            "report.missing_value" => Some(self.report.missing_value.clone()),
            "report.vertical_threshold" => Some(self.report.vertical_threshold.to_string()),

            "fonts.path" => self.fonts.path.as_ref().map(|p| p.display().to_string()),
            "fonts.names" => Some(self.fonts.names.join(",")),

            "shaping.enabled" => Some(self.shaping.enabled.to_string()),
            "shaping.delete_harakat" => Some(self.shaping.delete_harakat.to_string()),
            "shaping.support_ligatures" => Some(self.shaping.support_ligatures.to_string()),
            "shaping.rial_sign" => Some(self.shaping.rial_sign.to_string()),

            "logging.level" => Some(self.logging.level.clone()),
            "logging.color" => Some(self.logging.color.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "general.output_dir" => {
                self.general.output_dir = PathBuf::from(value);
            }
            "general.jobs" => {
                self.general.jobs = if value.is_empty() {
                    None
                } else {
                    Some(parse_value(value, "jobs")?)
                };
            }
            "general.auto_yes" => {
                self.general.auto_yes = parse_value(value, "auto_yes")?;
            }
            "general.open_output" => {
                self.general.open_output = parse_value(value, "open_output")?;
            }

            "report.name_column" => {
                self.report.name_column = value.to_string();
            }
            "report.sheet" => {
                self.report.sheet = if value.is_empty() { None } else { Some(value.to_string()) };
            }
            "report.title" => {
                self.report.title = value.to_string();
            }
            "report.date_label" => {
                self.report.date_label = value.to_string();
            }
            "report.timestamp_format" => {
                self.report.timestamp_format = value.to_string();
            }
            "report.missing_value" => {
                self.report.missing_value = value.to_string();
            }
            "report.vertical_threshold" => {
                self.report.vertical_threshold = parse_value(value, "vertical_threshold")?;
            }

            "fonts.path" => {
                self.fonts.path = if value.is_empty() { None } else { Some(PathBuf::from(value)) };
            }
            "fonts.names" => {
                self.fonts.names = value
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect();
            }

            "shaping.enabled" => {
                self.shaping.enabled = parse_value(value, "enabled")?;
            }
            "shaping.delete_harakat" => {
                self.shaping.delete_harakat = parse_value(value, "delete_harakat")?;
            }
            "shaping.support_ligatures" => {
                self.shaping.support_ligatures = parse_value(value, "support_ligatures")?;
            }
            "shaping.rial_sign" => {
                self.shaping.rial_sign = parse_value(value, "rial_sign")?;
            }

            "logging.level" => {
                self.logging.level = value.to_string();
            }
            "logging.color" => {
                self.logging.color = parse_value(value, "color")?;
            }

            _ => {
                return Err(SheetslipError::Config(format!("Unknown configuration key: {}", key)));
            }
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(value: &str, field: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| SheetslipError::Config(format!("Invalid value '{}' for {}", value, field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.report.name_column, "نام");
        assert_eq!(config.report.vertical_threshold, 10);
        assert!(config.shaping.enabled);
        assert_eq!(config.fonts.names[0], "Vazir.ttf");
        assert_eq!(config.fonts.search_dirs[0], PathBuf::new());
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        config.set("general.auto_yes", "true").unwrap();
        assert_eq!(config.get("general.auto_yes"), Some("true".to_string()));

        config.set("report.vertical_threshold", "6").unwrap();
        assert_eq!(config.get("report.vertical_threshold"), Some("6".to_string()));

        config.set("fonts.names", "A.ttf, B.ttf").unwrap();
        assert_eq!(config.fonts.names, vec!["A.ttf", "B.ttf"]);

        config.set("report.sheet", "").unwrap();
        assert_eq!(config.get("report.sheet"), None);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("general.jobs", "many").is_err());
        assert!(config.set("shaping.enabled", "yes please").is_err());
        assert!(config.set("no.such.key", "1").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("report.name_column", "Name").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[report]\nname_column = \"Employee\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.report.name_column, "Employee");
        assert_eq!(loaded.report.missing_value, "-");
        assert!(loaded.shaping.enabled);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init(&path, false).unwrap();
        assert!(Config::init(&path, false).is_err());
        assert!(Config::init(&path, true).is_ok());
    }
}
