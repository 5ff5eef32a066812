use crate::error::{FlowError, Result};
use crate::paths;
use crate::project;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgencyConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsConfig {
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
}

fn default_code_prefix() -> String {
    "PRJ".to_string()
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            code_prefix: default_code_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Also notify on direct status changes, not only assignments.
    #[serde(default = "default_true")]
    pub notify_on_status_change: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            notify_on_status_change: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub agency: AgencyConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(agency_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            agency: AgencyConfig {
                name: agency_name.into(),
                description: None,
            },
            projects: ProjectsConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(FlowError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::config_path(root), self)
    }

    pub fn notifies_assignments(&self) -> bool {
        self.notifications.enabled
    }

    pub fn notifies_status_changes(&self) -> bool {
        self.notifications.enabled && self.notifications.notify_on_status_change
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.agency.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "agency.name is empty".to_string(),
            });
        }

        if !project::is_valid_prefix(&self.projects.code_prefix) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "projects.code_prefix '{}' must be 1-10 uppercase letters or digits, starting with a letter",
                    self.projects.code_prefix
                ),
            });
        }

        if !self.notifications.enabled {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "notifications are disabled: assignees will not be told about new work"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("Northlight Studio");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.agency.name, "Northlight Studio");
        assert_eq!(parsed.projects.code_prefix, "PRJ");
        assert!(parsed.notifies_status_changes());
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("agency:\n  name: Acme\n").unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.projects.code_prefix, "PRJ");
        assert!(cfg.notifications.enabled);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn load_without_init_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(FlowError::NotInitialized)
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("Acme");
        cfg.projects.code_prefix = "ACME".into();
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.projects.code_prefix, "ACME");
    }

    #[test]
    fn validate_flags_bad_prefix_and_disabled_notifications() {
        let mut cfg = Config::new("");
        cfg.projects.code_prefix = "prj".into();
        cfg.notifications.enabled = false;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
        assert!(!cfg.notifies_assignments());
        assert!(!cfg.notifies_status_changes());
    }
}
