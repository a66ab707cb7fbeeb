//! Configuration management for htmlterm.
//!
//! Settings are read from `~/.htmlterm/config.toml`:
//!
//! ```toml
//! rows = 40
//! columns = 80
//! scrollback = 500
//!
//! # Initial dynamic title, and an optional fixed title that overrides it
//! title = "shell"
//! static_title = "build server"
//!
//! # Theme: default, dracula, gruvbox, nord, solarized-dark, solarized-light
//! theme = "nord"
//! # Or a theme file, which takes precedence over `theme`
//! # theme_file = "/path/to/theme.toml"
//!
//! [log]
//! level = "info"
//! file = "/tmp/htmlterm.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::term::state::{DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_SCROLLBACK};
use crate::error::{Error, Result};
use crate::theme::Theme;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Viewport height
    pub rows: usize,
    /// Viewport width
    pub columns: usize,
    /// Rows kept per screen, scrollback included
    pub scrollback: usize,
    /// Initial dynamic title
    pub title: String,
    /// Fixed title shadowing anything the remote end sets
    pub static_title: Option<String>,
    /// Built-in theme name
    pub theme: String,
    /// Theme file overriding `theme`
    pub theme_file: Option<PathBuf>,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            scrollback: DEFAULT_SCROLLBACK,
            title: String::new(),
            static_title: None,
            theme: "default".to_string(),
            theme_file: None,
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Log to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        let (config, error) = Self::load_or_default();
        if let Some(e) = error {
            tracing::warn!("Ignoring config: {}", e);
        }
        config
    }

    /// Like [`Config::load`], but returns the load failure instead of
    /// logging it, for callers that install logging from the result.
    pub fn load_or_default() -> (Self, Option<Error>) {
        match Self::config_path() {
            Some(path) => Self::load_or_default_from(&path),
            None => (Self::default(), None),
        }
    }

    fn load_or_default_from(path: &Path) -> (Self, Option<Error>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::ConfigParse { source, .. } => Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| Error::ConfigParse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(Error::InvalidArgument(format!(
                "terminal size must be positive, got {}x{}",
                self.rows, self.columns
            )));
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".htmlterm").join("config.toml"))
    }

    /// Resolve the configured theme
    pub fn theme(&self) -> Result<Theme> {
        match &self.theme_file {
            Some(path) => Theme::load_from(path),
            None => Theme::by_name(&self.theme),
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!((config.rows, config.columns), (40, 80));
        assert_eq!(config.scrollback, 500);
        assert_eq!(config.theme, "default");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("columns = 120\n[log]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.columns, 120);
        assert_eq!(config.rows, 40);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, None);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml_str("rows = \"many\""),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Config::from_toml_str("rows = 0"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            rows: 24,
            static_title: Some("pinned".to_string()),
            theme: "nord".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_from_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "rows = [").unwrap();
        match Config::load_from(&path) {
            Err(Error::ConfigParse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("absent.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_load_or_default_hands_back_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let (config, error) = Config::load_or_default_from(&path);
        assert_eq!(config, Config::default());
        assert!(error.is_none());

        fs::write(&path, "columns = \"wide\"").unwrap();
        let (config, error) = Config::load_or_default_from(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(error, Some(Error::ConfigParse { .. })));

        fs::write(&path, "columns = 132").unwrap();
        let (config, error) = Config::load_or_default_from(&path);
        assert_eq!(config.columns, 132);
        assert!(error.is_none());
    }

    #[test]
    fn test_theme_resolution() {
        let mut config = Config {
            theme: "dracula".to_string(),
            ..Config::default()
        };
        assert_eq!(config.theme().unwrap().name, "dracula");

        config.theme = "nope".to_string();
        assert!(matches!(config.theme(), Err(Error::UnknownTheme(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.toml");
        let mut custom = Theme::gruvbox();
        custom.name = "custom".to_string();
        fs::write(&path, toml::to_string(&custom).unwrap()).unwrap();
        config.theme_file = Some(path);
        assert_eq!(config.theme().unwrap(), custom);
    }
}
