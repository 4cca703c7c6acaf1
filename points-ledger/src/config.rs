//! Configuration for the points service

use crate::allocator::SpendPolicy;
use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address
    pub listen_addr: String,

    /// Emit JSON log lines
    pub log_json: bool,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Spend configuration
    pub spend: SpendConfig,

    /// Payers registered at startup
    pub seed_payers: Vec<SeedPayer>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "points-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:8999".to_string(),
            log_json: false,
            actor: ActorConfig::default(),
            spend: SpendConfig::default(),
            seed_payers: vec![
                SeedPayer::new("DANNON", "Dannon"),
                SeedPayer::new("UNILEVER", "Unilever"),
                SeedPayer::new("MILLER COORS", "Miller Coors"),
            ],
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Spend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpendConfig {
    /// Behavior when a spend exceeds the total balance
    pub policy: SpendPolicy,
}

/// Payer registered at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPayer {
    /// Payer ID
    pub id: String,
    /// Display name
    pub name: String,
}

impl SeedPayer {
    /// Create seed entry
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Config::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this config
    pub fn with_env_overrides(mut self) -> crate::Result<Self> {
        if let Ok(addr) = std::env::var("POINTS_LISTEN_ADDR") {
            self.listen_addr = addr;
        }

        if let Ok(policy) = std::env::var("POINTS_SPEND_POLICY") {
            self.spend.policy = policy.parse()?;
        }

        if let Ok(capacity) = std::env::var("POINTS_MAILBOX_CAPACITY") {
            self.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid POINTS_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(json) = std::env::var("POINTS_LOG_JSON") {
            self.log_json = matches!(json.as_str(), "1" | "true" | "yes");
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }

        if let Some(seed) = self.seed_payers.iter().find(|s| s.id.trim().is_empty()) {
            return Err(crate::Error::Config(format!(
                "Seed payer '{}' has an empty id",
                seed.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "points-ledger");
        assert_eq!(config.listen_addr, "0.0.0.0:8999");
        assert_eq!(config.spend.policy, SpendPolicy::Partial);
        assert_eq!(config.seed_payers.len(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file_partial_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
listen_addr = "127.0.0.1:9000"

[spend]
policy = "reject"

[[seed_payers]]
id = "ACME"
name = "Acme Corp"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.spend.policy, SpendPolicy::Reject);
        assert_eq!(config.seed_payers, vec![SeedPayer::new("ACME", "Acme Corp")]);
        assert_eq!(config.actor.mailbox_capacity, 1000);
    }

    #[test]
    fn test_from_file_rejects_zero_mailbox() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[actor]\nmailbox_capacity = 0").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
