//! `config.toml` loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use kubedeck_types::ResourceKind;

const CONFIG_ENV: &str = "KUBEDECK_CONFIG";

const MAX_NOTIFICATION_TTL_SECS: u64 = 24 * 60 * 60;
const MAX_AUDIT_CAPACITY: usize = 100_000;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub session: SessionConfig,
    pub console: ConsoleSettings,
    pub access: AccessConfig,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Defaults to `$USER`
    pub user: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleSettings {
    pub default_kind: ResourceKind,
    pub tick_rate_ms: u64,
    pub notification_ttl_secs: u64,
    pub audit_capacity: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            default_kind: ResourceKind::Deployments,
            tick_rate_ms: 250,
            notification_ttl_secs: 5,
            audit_capacity: 500,
        }
    }
}

impl ConsoleSettings {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(16))
    }

    /// Capped at one day
    pub fn notification_ttl(&self) -> chrono::Duration {
        let secs = self.notification_ttl_secs.min(MAX_NOTIFICATION_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn audit_capacity(&self) -> usize {
        self.audit_capacity.clamp(1, MAX_AUDIT_CAPACITY)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Role required for admin-only views
    pub admin_role: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_role: "admin".to_string(),
        }
    }
}

impl Config {
    /// Load from the first of `--config`, `$KUBEDECK_CONFIG` and the user config
    /// directory. A missing default file yields defaults; an explicitly named
    /// file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env) {
            Some(path) => Self::from_file(&path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kubedeck").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.console.default_kind, ResourceKind::Deployments);
        assert_eq!(config.access.admin_role, "admin");
        assert_eq!(config.console.tick_rate(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::parse(
            r#"
            [session]
            user = "alice"
            roles = ["admin", "ops"]

            [console]
            default_kind = "pods"
            notification_ttl_secs = 10

            [access]
            admin_role = "ops"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.user.as_deref(), Some("alice"));
        assert_eq!(config.session.roles, ["admin", "ops"]);
        assert_eq!(config.console.default_kind, ResourceKind::Pods);
        assert_eq!(config.console.notification_ttl(), chrono::Duration::seconds(10));
        assert_eq!(config.console.audit_capacity(), 500);
        assert_eq!(config.access.admin_role, "ops");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("[console]\ntick_rate = 5\n").is_err());
        assert!(Config::parse("[console]\ndefault_kind = \"widgets\"\n").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::from_file(Path::new("/nonexistent/kubedeck.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }

    #[test]
    fn test_oversized_values_are_capped() {
        let config = Config::parse(
            r#"
            [console]
            notification_ttl_secs = 100000000000000000
            audit_capacity = 9223372036854775807
            "#,
        )
        .unwrap();
        assert_eq!(config.console.notification_ttl(), chrono::Duration::days(1));
        assert_eq!(config.console.audit_capacity(), MAX_AUDIT_CAPACITY);

        let config = Config::parse("[console]\naudit_capacity = 0\n").unwrap();
        assert_eq!(config.console.audit_capacity(), 1);
    }

    #[test]
    fn test_tick_rate_has_a_floor() {
        let settings = ConsoleSettings {
            tick_rate_ms: 0,
            ..ConsoleSettings::default()
        };
        assert_eq!(settings.tick_rate(), Duration::from_millis(16));
    }
}
