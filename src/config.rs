// src/config.rs
// Table options and the host binary's YAML configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::ComponentRef;
use crate::error::{PropertyTableError, Result};

pub const CONFIG_ENV: &str = "PROPERTY_TABLE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./property-table.yml";

/// Options fixed when the table is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyTableConfig {
    pub read_only: bool,
    /// Where secondary dialogs are mounted. Without one there is no
    /// add-property affordance.
    pub dialog_container: Option<String>,
    /// The host can switch the table to a referenced controller service.
    pub supports_navigation: bool,
}

/// What to do with unsaved edits when the user follows a service link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsavedChangesPolicy {
    Save,
    Discard,
    #[default]
    Cancel,
}

fn default_timeout() -> u64 {
    30
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// API root, e.g. `http://localhost:8080/nifi-api`
    pub base_url: String,
    pub component: ComponentRef,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub unsaved_changes: UnsavedChangesPolicy,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub table: PropertyTableConfig,
}

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub error: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

impl From<ValidationError> for PropertyTableError {
    fn from(error: ValidationError) -> Self {
        PropertyTableError::ConfigError(error.to_string())
    }
}

fn invalid(field: &str, error: &str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        error: error.to_string(),
    }
}

impl ConsoleConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ConsoleConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read from `$PROPERTY_TABLE_CONFIG`, falling back to `./property-table.yml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(invalid("base_url", "Must start with http:// or https://").into());
        }

        if self.component.id.trim().is_empty() {
            return Err(invalid("component.id", "Cannot be empty").into());
        }

        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "Must be greater than 0").into());
        }

        if self.log_dir.as_os_str().is_empty() {
            return Err(invalid("log_dir", "Cannot be empty").into());
        }

        if let Some(container) = &self.table.dialog_container {
            if container.trim().is_empty() {
                return Err(invalid("table.dialog_container", "Omit it instead of leaving it blank").into());
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use std::io::Write;

    const VALID: &str = r#"
base_url: "http://localhost:8080/nifi-api"
component:
  kind: processor
  id: "0a1b2c"
unsaved_changes: save
table:
  dialog_container: "main"
  supports_navigation: true
"#;

    #[test]
    fn test_valid_config() {
        let config = ConsoleConfig::from_yaml(VALID).unwrap();
        assert_eq!(config.component.kind, ComponentKind::Processor);
        assert_eq!(config.unsaved_changes, UnsavedChangesPolicy::Save);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_dir, PathBuf::from("./logs"));
        assert!(!config.table.read_only);
        assert!(config.table.supports_navigation);
    }

    #[test]
    fn test_defaults() {
        let yaml = "base_url: https://h\ncomponent: { kind: controller-service, id: s }\n";
        let config = ConsoleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.unsaved_changes, UnsavedChangesPolicy::Cancel);
        assert_eq!(config.table, PropertyTableConfig::default());
        assert_eq!(config.table.dialog_container, None);
    }

    #[test]
    fn test_invalid_base_url() {
        let yaml = VALID.replace("http://localhost", "localhost");
        let err = ConsoleConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_empty_component_id() {
        let yaml = VALID.replace("\"0a1b2c\"", "\" \"");
        assert!(ConsoleConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let yaml = format!("{}request_timeout_secs: 0\n", VALID);
        assert!(ConsoleConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_unknown_kind() {
        let yaml = VALID.replace("processor", "funnel");
        assert!(matches!(ConsoleConfig::from_yaml(&yaml), Err(PropertyTableError::YamlError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        let config = ConsoleConfig::load_from(file.path()).unwrap();
        assert_eq!(config.component.id, "0a1b2c");
    }
}
