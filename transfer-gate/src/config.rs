//! Configuration for the transfer gate

use crate::lock::LockConfig;
use crate::types::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};

/// Gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Accounts allowed to run administrative operations
    pub administrators: Vec<AccountId>,

    /// Lock state the gate starts with
    pub lock: LockSettings,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Default log directive when `RUST_LOG` is unset
    pub log_level: String,

    /// Collect Prometheus counters
    pub metrics_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "transfer-gate".to_string(),
            administrators: Vec::new(),
            lock: LockSettings::default(),
            actor: ActorConfig::default(),
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}

/// Starting lock state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Global lock switch
    pub locked: bool,

    /// End of the hard lock
    pub first_unlock_time: Timestamp,

    /// End of the quota window
    pub second_unlock_time: Timestamp,
}

impl LockSettings {
    /// As a lock configuration value
    pub fn to_lock_config(&self) -> LockConfig {
        LockConfig::new(self.locked, self.first_unlock_time, self.second_unlock_time)
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox capacity (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(name) = std::env::var("GATE_SERVICE_NAME") {
            config.service_name = name;
        }

        if let Ok(admins) = std::env::var("GATE_ADMINISTRATORS") {
            config.administrators = admins
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(AccountId::new)
                .collect();
        }

        if let Ok(locked) = std::env::var("GATE_LOCKED") {
            config.lock.locked = parse_env("GATE_LOCKED", &locked)?;
        }

        if let Ok(at) = std::env::var("GATE_FIRST_UNLOCK_TIME") {
            config.lock.first_unlock_time = parse_env("GATE_FIRST_UNLOCK_TIME", &at)?;
        }

        if let Ok(at) = std::env::var("GATE_SECOND_UNLOCK_TIME") {
            config.lock.second_unlock_time = parse_env("GATE_SECOND_UNLOCK_TIME", &at)?;
        }

        if let Ok(capacity) = std::env::var("GATE_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = parse_env("GATE_MAILBOX_CAPACITY", &capacity)?;
        }

        if let Ok(level) = std::env::var("GATE_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| crate::Error::Config(format!("Invalid {}={:?}: {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "transfer-gate");
        assert_eq!(config.actor.mailbox_capacity, 1000);
        assert!(!config.lock.locked);
        assert!(config.administrators.is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            administrators = ["owner"]

            [lock]
            locked = true
            first_unlock_time = 1700000000
            second_unlock_time = 1731536000
            "#,
        )
        .unwrap();

        assert_eq!(config.administrators, vec![AccountId::new("owner")]);
        assert_eq!(
            config.lock.to_lock_config(),
            LockConfig::new(true, 1_700_000_000, 1_731_536_000)
        );
        assert_eq!(config.actor.mailbox_capacity, 1000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service_name = \"gate-test\"").unwrap();
        writeln!(file, "[actor]").unwrap();
        writeln!(file, "mailbox_capacity = 8").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service_name, "gate-test");
        assert_eq!(config.actor.mailbox_capacity, 8);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("lock = 5").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    // Only test that touches GATE_* variables
    #[test]
    fn test_from_env() {
        let vars = [
            ("GATE_SERVICE_NAME", "gate-env"),
            ("GATE_ADMINISTRATORS", "owner, treasury,,"),
            ("GATE_LOCKED", "true"),
            ("GATE_FIRST_UNLOCK_TIME", "1700000000"),
            ("GATE_SECOND_UNLOCK_TIME", "1731536000"),
            ("GATE_MAILBOX_CAPACITY", "16"),
            ("GATE_LOG_LEVEL", "debug"),
        ];
        for (name, value) in vars {
            std::env::set_var(name, value);
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.service_name, "gate-env");
        assert_eq!(
            config.administrators,
            vec![AccountId::new("owner"), AccountId::new("treasury")]
        );
        assert_eq!(
            config.lock.to_lock_config(),
            LockConfig::new(true, 1_700_000_000, 1_731_536_000)
        );
        assert_eq!(config.actor.mailbox_capacity, 16);
        assert_eq!(config.log_level, "debug");

        std::env::set_var("GATE_LOCKED", "sometimes");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("GATE_LOCKED"));

        for (name, _) in vars {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        let err = parse_env::<u64>("GATE_FIRST_UNLOCK_TIME", "soon").unwrap_err();
        assert!(err.to_string().contains("GATE_FIRST_UNLOCK_TIME"));
    }
}
