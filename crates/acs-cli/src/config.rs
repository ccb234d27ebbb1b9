//! Configuration loading and management.

use std::path::{Path, PathBuf};

use acs_core::{Classifier, ConfigError, NegativeDurationPolicy, ReaderConfig};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Default report file name, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "result.xlsx";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where the report workbook is written.
    pub output_path: PathBuf,

    /// Handling of sessions whose exit precedes the enter.
    #[serde(default)]
    pub negative_duration: NegativeDurationPolicy,

    /// Column layout and scan classification of the ACS export.
    #[serde(default)]
    pub reader: ReaderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            negative_duration: NegativeDurationPolicy::default(),
            reader: ReaderConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
                figment.merge(Json::file(path))
            } else {
                figment.merge(Toml::file(path))
            };
        }

        // Load from environment variables (ACS_*, nested keys split on `__`)
        figment = figment.merge(Env::prefixed("ACS_").split("__"));

        figment.extract()
    }

    /// Rejects unusable layouts and warns about ambiguous prefix rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reader.validate()?;
        for (plus, minus) in Classifier::new(&self.reader.classifier).overlapping_prefixes() {
            tracing::warn!(
                plus = %plus,
                minus = %minus,
                "direction prefixes overlap; matching codes will count as enter"
            );
        }
        Ok(())
    }
}

/// Returns the platform-specific config directory for acs-report.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("acs-report"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dirs_config_path_ends_with_app_name() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "acs-report");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.output_path, PathBuf::from("result.xlsx"));
        assert_eq!(config.negative_duration, NegativeDurationPolicy::Clamp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_overrides_nested_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
negative_duration = "skip"

[reader]
row_first = 5
col_area = 12
col_badge = 3
direction_plus_prefixes = ["ВХОД", "ENTRY"]
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.negative_duration, NegativeDurationPolicy::Skip);
        assert_eq!(config.reader.row_first, 5);
        assert_eq!(config.reader.col_area, 12);
        assert_eq!(config.reader.col_badge, Some(3));
        assert_eq!(config.reader.col_name, 1);
        assert_eq!(
            config.reader.classifier.direction_plus_prefixes,
            vec!["ВХОД".to_string(), "ENTRY".to_string()]
        );
        assert_eq!(config.reader.classifier.status_success_prefix, "SUCCESS");
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"reader": {{"status_success_prefix": "GRANTED", "col_time": 9}}}}"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.reader.classifier.status_success_prefix, "GRANTED");
        assert_eq!(config.reader.col_time, 9);
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "reader = 5").unwrap();

        assert!(Config::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_surfaces_reader_errors() {
        let mut config = Config::default();
        config.reader.col_status = 0;

        assert_eq!(
            config.validate(),
            Err(ConfigError::Column { field: "col_status" })
        );
    }
}
