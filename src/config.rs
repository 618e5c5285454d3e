use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::types::CompletionSignal;

/// Environment prefix for layered overrides, e.g. `DNAC_PURGE_DNAC__HOST`.
pub const ENV_PREFIX: &str = "DNAC_PURGE_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dnac: DnacConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnacConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DnacConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            verify_tls: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DnacConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_inventory_path")]
    pub path: PathBuf,
    #[serde(default = "default_column")]
    pub column: String,
    #[serde(default)]
    pub sheet: Option<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
            column: default_column(),
            sheet: None,
        }
    }
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("removal.xlsx")
}

fn default_column() -> String {
    "hostname".to_string()
}

/// Knobs that select between the lean and the careful deletion sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_true")]
    pub check_provisioning: bool,
    #[serde(default = "default_true")]
    pub verify_deletion: bool,
    #[serde(default = "default_true")]
    pub clean_config: bool,
    #[serde(default = "default_settle_secs")]
    pub unprovision_settle_secs: u64,
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
    #[serde(default)]
    pub poll: PollConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            check_provisioning: true,
            verify_deletion: true,
            clean_config: true,
            unprovision_settle_secs: default_settle_secs(),
            throttle_secs: default_throttle_secs(),
            poll: PollConfig::default(),
        }
    }
}

impl LifecycleConfig {
    pub fn unprovision_settle(&self) -> Duration {
        Duration::from_secs(self.unprovision_settle_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_settle_secs() -> u64 {
    10
}

fn default_throttle_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub completion: CompletionSignal,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
            completion: CompletionSignal::default(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_interval_secs() -> u64 {
    2
}

fn default_max_attempts() -> u32 {
    30
}

impl Config {
    /// Defaults, then `DNAC_PURGE_*` environment variables. Nested keys are
    /// separated by a double underscore.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        figment.extract().context("loading dnac-purge configuration")
    }

    /// Checks that only make sense once every layer, CLI flags included,
    /// has been applied.
    pub fn validate(&self) -> Result<()> {
        if self.dnac.host.trim().is_empty() {
            bail!(
                "no DNAC host configured (use --host or {}DNAC__HOST)",
                ENV_PREFIX
            );
        }
        if self.lifecycle.poll.max_attempts == 0 {
            bail!("lifecycle.poll.max_attempts must be at least 1");
        }
        Ok(())
    }
}

pub fn load() -> Result<Config> {
    Config::from_figment(&Config::figment())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_careful_variant() {
        let cfg = Config::default();
        assert_eq!(cfg.inventory.path, PathBuf::from("removal.xlsx"));
        assert_eq!(cfg.inventory.column, "hostname");
        assert!(!cfg.dnac.verify_tls);
        assert!(cfg.lifecycle.check_provisioning);
        assert!(cfg.lifecycle.verify_deletion);
        assert!(cfg.lifecycle.clean_config);
        assert_eq!(cfg.lifecycle.unprovision_settle(), Duration::from_secs(10));
        assert_eq!(cfg.lifecycle.throttle(), Duration::from_secs(5));
        assert_eq!(cfg.lifecycle.poll.interval(), Duration::from_secs(2));
        assert_eq!(cfg.lifecycle.poll.max_attempts, 30);
        assert_eq!(
            cfg.lifecycle.poll.completion,
            CompletionSignal::EndTimeOrProgress
        );
    }

    #[test]
    fn layered_provider_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(
            Serialized::defaults(json!({
                "dnac": { "host": "https://dnac.example.net", "username": "admin", "password": "pw" },
                "lifecycle": { "check_provisioning": false, "poll": { "max_attempts": 10, "completion": "progress" } }
            })),
        );

        let cfg = Config::from_figment(&figment).unwrap();
        assert_eq!(cfg.dnac.host, "https://dnac.example.net");
        assert_eq!(cfg.dnac.username, "admin");
        assert!(!cfg.lifecycle.check_provisioning);
        assert!(cfg.lifecycle.verify_deletion);
        assert_eq!(cfg.lifecycle.poll.max_attempts, 10);
        assert_eq!(cfg.lifecycle.poll.interval_secs, 2);
        assert_eq!(cfg.lifecycle.poll.completion, CompletionSignal::Progress);
    }

    fn with_host() -> Config {
        let mut cfg = Config::default();
        cfg.dnac.host = "dnac.lab".into();
        cfg
    }

    #[test]
    fn validate_accepts_defaults_with_host() {
        assert!(with_host().validate().is_ok());
    }

    #[test]
    fn validate_requires_host() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("no DNAC host"));
    }

    #[test]
    fn validate_rejects_zero_poll_budget() {
        let figment = Figment::from(Serialized::defaults(with_host()))
            .merge(Serialized::defaults(json!({ "lifecycle": { "poll": { "max_attempts": 0 } } })));
        let cfg = Config::from_figment(&figment).unwrap();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn rejects_unknown_completion_signal() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(
            Serialized::defaults(json!({ "lifecycle": { "poll": { "completion": "eventually" } } })),
        );

        assert!(Config::from_figment(&figment).is_err());
    }
}
