//! Application configuration.
//!
//! Defines the YAML-serializable settings an [`AppBuilder`](crate::AppBuilder)
//! can take instead of (or on top of) code: name, documentation, version,
//! the modules to load, and how interrupted commands exit.
//!
//! # Example YAML
//!
//! ```yaml
//! name: demo
//! description: |
//!   Demo application
//!
//!   Shows every kind of command.
//! version: "0.3"
//! command_modules:
//!   - tools
//! subcommand_modules:
//!   - pkg.greetings
//! manifest_dir: ./commands
//! interrupt_exit_code: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatch::InterruptPolicy;
use crate::error::ConfigError;
use crate::manifest::{HandlerTable, ManifestLoader};

/// Settings applied by [`AppBuilder::config`](crate::AppBuilder::config).
///
/// Every field is optional; absent fields leave the builder unchanged.
///
/// # Examples
///
/// ```
/// use skal_app::{AppConfig, InterruptPolicy};
///
/// let config: AppConfig = serde_yaml::from_str("version: \"1.0\"\ninterrupt_exit_code: 4\n").unwrap();
/// assert_eq!(config.version.as_deref(), Some("1.0"));
/// assert_eq!(config.interrupt_policy(), Some(InterruptPolicy::ExitCode(4)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Program name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Application documentation (help line, blank line, description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version shown by `--version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Modules whose commands join the root scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_modules: Vec<String>,
    /// Modules grouped under their own subcommand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommand_modules: Vec<String>,
    /// Directory of module manifests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_dir: Option<PathBuf>,
    /// Exit code for interrupted commands (0 to 255); unset propagates the
    /// interrupt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_exit_code: Option<u8>,
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written, or
    /// [`ConfigError::Yaml`] if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Interrupt policy requested by the configuration, if any.
    pub fn interrupt_policy(&self) -> Option<InterruptPolicy> {
        self.interrupt_exit_code.map(InterruptPolicy::ExitCode)
    }

    /// Manifest loader for `manifest_dir`, resolved against `base` when
    /// relative.
    pub fn manifest_loader(
        &self,
        base: impl AsRef<Path>,
        handlers: HandlerTable,
    ) -> Option<ManifestLoader> {
        let dir = self.manifest_dir.as_ref()?;
        let dir = if dir.is_absolute() {
            dir.clone()
        } else {
            base.as_ref().join(dir)
        };
        Some(ManifestLoader::new(dir, handlers))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
name: demo
description: |
  Demo application

  Shows every kind of command.
version: "0.3"
command_modules:
  - tools
subcommand_modules:
  - pkg.greetings
manifest_dir: commands
interrupt_exit_code: 4
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: AppConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.name.as_deref(), Some("demo"));
        assert_eq!(config.version.as_deref(), Some("0.3"));
        assert_eq!(config.command_modules, vec!["tools"]);
        assert_eq!(config.subcommand_modules, vec!["pkg.greetings"]);
        assert_eq!(config.interrupt_policy(), Some(InterruptPolicy::ExitCode(4)));
        assert!(config.description.unwrap().starts_with("Demo application\n"));
    }

    #[test]
    fn test_deserialize_empty() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.interrupt_policy(), None);
    }

    #[test]
    fn test_out_of_range_interrupt_exit_code_is_rejected() {
        for yaml in ["interrupt_exit_code: 300\n", "interrupt_exit_code: -1\n"] {
            assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err(), "{yaml}");
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("skal.yaml");
        std::fs::write(&path, "interrupt_exit_code: 256\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("skal.yaml");
        let config: AppConfig = serde_yaml::from_str(sample_yaml()).unwrap();

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_manifest_loader_resolves_relative_dir() {
        let config: AppConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let loader = config
            .manifest_loader("/etc/demo", HandlerTable::new())
            .unwrap();
        assert_eq!(loader.dir(), Path::new("/etc/demo/commands"));

        assert!(
            AppConfig::default()
                .manifest_loader("/etc/demo", HandlerTable::new())
                .is_none()
        );
    }
}
