//! YAML registry configuration.
//!
//! Deployments can describe their flag table in a file instead of relying on
//! [`FlagRegistry::standard`].
//!
//! # Example YAML
//!
//! ```yaml
//! case_insensitive_bools: false
//! flags:
//!   - name: explain
//!     type: bool
//!     default: false
//!   - name: analyze
//!     type: bool
//!     default: false
//!     description: Collect per-operator execution statistics
//!   - name: max_output_rows_per_table
//!     type: int
//!     default: 10000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{FlagRegistry, FlagSpec, RegistryError};

/// Errors that can occur while loading or saving a registry file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file parsed but describes an invalid registry.
    #[error("invalid registry: {0}")]
    InvalidRegistry(#[from] RegistryError),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Serializable form of a [`FlagRegistry`].
///
/// # Examples
///
/// ```
/// use query_flags_core::RegistryConfig;
///
/// let yaml = r#"
/// flags:
///   - name: analyze
///     type: bool
///     default: false
/// "#;
/// let config = RegistryConfig::from_yaml_str(yaml).unwrap();
/// let registry = config.into_registry().unwrap();
/// assert!(registry.contains("analyze"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Accept boolean literals regardless of ASCII case.
    #[serde(default)]
    pub case_insensitive_bools: bool,
    /// Flag declarations.
    pub flags: Vec<FlagSpec>,
}

impl RegistryConfig {
    /// Parses configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Validates and builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRegistry`](ConfigError::InvalidRegistry) when a flag
    /// name is invalid, duplicated, or has a mistyped default.
    pub fn into_registry(self) -> Result<FlagRegistry> {
        let registry = FlagRegistry::builder()
            .case_insensitive_bools(self.case_insensitive_bools)
            .flags(self.flags)
            .build()?;
        Ok(registry)
    }
}

impl From<&FlagRegistry> for RegistryConfig {
    fn from(registry: &FlagRegistry) -> Self {
        Self {
            case_insensitive_bools: registry.rules().case_insensitive_bools,
            flags: registry.iter().cloned().collect(),
        }
    }
}

impl FlagRegistry {
    /// Builds a registry from YAML text.
    ///
    /// # Errors
    ///
    /// See [`RegistryConfig::from_yaml_str`] and
    /// [`RegistryConfig::into_registry`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        RegistryConfig::from_yaml_str(yaml)?.into_registry()
    }

    /// Loads a registry from a YAML file.
    ///
    /// # Errors
    ///
    /// See [`RegistryConfig::load`] and [`RegistryConfig::into_registry`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        RegistryConfig::load(path)?.into_registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlagType, FlagValue};

    fn sample_yaml() -> &'static str {
        r#"
case_insensitive_bools: true
flags:
  - name: explain
    type: bool
    default: false
  - name: analyze
    type: bool
    default: true
    description: Collect per-operator execution statistics
  - name: max_output_rows_per_table
    type: int
    default: 500
  - name: engine
    type: string
    default: vectorized
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config = RegistryConfig::from_yaml_str(sample_yaml()).unwrap();
        assert!(config.case_insensitive_bools);
        assert_eq!(config.flags.len(), 4);
        assert_eq!(config.flags[1].name, "analyze");
        assert_eq!(config.flags[1].default, FlagValue::Bool(true));
        assert_eq!(config.flags[2].value_type, FlagType::Int);
        assert_eq!(config.flags[3].default, FlagValue::String("vectorized".into()));
    }

    #[test]
    fn test_type_defaults_to_bool() {
        let yaml = "flags:\n  - name: explain\n    default: false\n";
        let registry = FlagRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.get("explain").unwrap().value_type, FlagType::Bool);
        assert!(!registry.rules().case_insensitive_bools);
    }

    #[test]
    fn test_mistyped_default_is_rejected() {
        let yaml = "flags:\n  - name: limit\n    type: int\n    default: lots\n";
        let err = FlagRegistry::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRegistry(RegistryError::DefaultTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        let err = RegistryConfig::from_yaml_str("flags: [").unwrap_err();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }

    #[test]
    fn test_from_registry() {
        let config = RegistryConfig::from(FlagRegistry::standard());
        assert!(!config.case_insensitive_bools);
        let names: Vec<&str> = config.flags.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["analyze", "explain", "max_output_rows_per_table"]);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.yaml");

        let original = RegistryConfig::from_yaml_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = RegistryConfig::load(&path).unwrap();
        assert_eq!(loaded, original);

        let registry = FlagRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.rules().case_insensitive_bools);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegistryConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
