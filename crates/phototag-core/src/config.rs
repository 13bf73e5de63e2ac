use crate::error::{PhototagError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for phototag
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Seconds added to each capture timestamp before interpolation,
    /// correcting a camera clock that disagrees with the GPS clock.
    pub clock_offset: ConfigValue<i64>,
    /// Whether commits include the elevation rational.
    pub write_elevation: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            clock_offset: ConfigValue::new(0, ConfigSource::Default),
            write_elevation: ConfigValue::new(true, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| PhototagError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| PhototagError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(offset) = file_config.clock_offset {
            self.clock_offset.update(offset, ConfigSource::File);
        }

        if let Some(write_elevation) = file_config.write_elevation {
            self.write_elevation.update(write_elevation, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(offset_str) = env::var("PHOTOTAG_OFFSET") {
            match offset_str.parse::<i64>() {
                Ok(offset) => self.clock_offset.update(offset, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PHOTOTAG_OFFSET value '{}': expected signed seconds",
                    offset_str
                ),
            }
        }

        if let Ok(flag_str) = env::var("PHOTOTAG_WRITE_ELEVATION") {
            match parse_bool(&flag_str) {
                Ok(flag) => self.write_elevation.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PHOTOTAG_WRITE_ELEVATION value '{}': expected true or false",
                    flag_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(offset) = overrides.clock_offset {
            self.clock_offset.update(offset, ConfigSource::Cli);
        }

        if let Some(write_elevation) = overrides.write_elevation {
            self.write_elevation.update(write_elevation, ConfigSource::Cli);
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    clock_offset: Option<i64>,
    write_elevation: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub clock_offset: Option<i64>,
    pub write_elevation: Option<bool>,
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PhototagError::ConfigInvalid {
            key: "write_elevation".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.clock_offset.value, 0);
        assert_eq!(config.clock_offset.source, ConfigSource::Default);
        assert!(config.write_elevation.value);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
clock_offset = -3600
write_elevation = false
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.clock_offset.value, -3600);
        assert_eq!(config.clock_offset.source, ConfigSource::File);
        assert!(!config.write_elevation.value);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "clock_offset = \"not a number\"").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(PhototagError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            clock_offset: Some(90),
            write_elevation: None,
        });

        assert_eq!(config.clock_offset.value, 90);
        assert_eq!(config.clock_offset.source, ConfigSource::Cli);
        // This should still be the default
        assert_eq!(config.write_elevation.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("YES").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
