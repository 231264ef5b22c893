use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::e_cli::Cli;

/// Name of the optional per-package configuration file.
pub const CONFIG_FILE_NAME: &str = "dart-e.toml";

/// Settings read from `dart-e.toml` and then overridden by CLI flags.
///
/// ```toml
/// show_info_messages = false
/// dart = "/opt/flutter/bin/dart"
/// analyze_args = ["analyze", "--no-fatal-warnings"]
/// format = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub show_info_messages: bool,
    pub show_error_messages: bool,
    /// Program used for `analyze`, `format` and `fix`.
    pub dart: String,
    /// Analyzer arguments. The package folder is appended as the target.
    pub analyze_args: Vec<String>,
    /// Run the formatter on every edited file.
    pub format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            show_info_messages: true,
            show_error_messages: true,
            dart: "dart".to_string(),
            analyze_args: vec!["analyze".to_string()],
            format: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Loads `dart-e.toml` from `package_root`, falling back to the defaults
    /// when the file does not exist.
    pub fn load(package_root: &Path) -> Result<Self, ConfigError> {
        let path = package_root.join(CONFIG_FILE_NAME);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Applies the flags given on the command line on top of the file settings.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if cli.quiet {
            self.show_info_messages = false;
        }
        if cli.no_format {
            self.format = false;
        }
        if let Some(dart) = &cli.dart {
            self.dart = dart.clone();
        }
    }
}

/// User-facing messages, gated by the configuration.
///
/// Every message is also emitted as a `tracing` event regardless of the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    show_info: bool,
    show_error: bool,
}

impl Default for Messages {
    fn default() -> Self {
        Messages {
            show_info: true,
            show_error: true,
        }
    }
}

impl Messages {
    pub fn from_config(config: &Config) -> Self {
        Messages {
            show_info: config.show_info_messages,
            show_error: config.show_error_messages,
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!("{}", message);
        if self.show_info {
            println!("{}", message);
        }
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!("{}", message);
        if self.show_error {
            eprintln!("error: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "show_info_messages = false\nanalyze_args = [\"analyze\", \"--no-fatal-warnings\"]\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert!(!config.show_info_messages);
        assert!(config.show_error_messages);
        assert_eq!(config.dart, "dart");
        assert_eq!(config.analyze_args, vec!["analyze", "--no-fatal-warnings"]);
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "show_everything = true\n").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::default();
        let cli = Cli::parse_from(["dart-e", "--quiet", "--no-format", "--dart", "fvm-dart", "commas"]);
        config.apply_cli(&cli);
        assert!(!config.show_info_messages);
        assert!(!config.format);
        assert_eq!(config.dart, "fvm-dart");

        let messages = Messages::from_config(&config);
        assert_eq!(
            messages,
            Messages {
                show_info: false,
                show_error: true
            }
        );
    }
}
