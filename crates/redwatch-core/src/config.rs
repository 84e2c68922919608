use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Delay between the posts and comments fetches for one community, for
/// upstream fairness.
pub const INTER_FETCH_DELAY_SECS: u64 = 1;
/// Timeout for upstream feed requests.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;
/// Timeout for outgoing webhook requests.
pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Top-level config (redwatch.toml + REDWATCH_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedwatchConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub webhooks: WebhookPolicyConfig,
}

impl Default for RedwatchConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            poll: PollConfig::default(),
            upstream: UpstreamConfig::default(),
            webhooks: WebhookPolicyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Minutes between pipeline ticks.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Days to keep matches and content before the retention sweep deletes them.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Items requested per feed endpoint.
    #[serde(default = "default_feed_limit")]
    pub feed_limit: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            retention_days: default_retention_days(),
            feed_limit: default_feed_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPolicyConfig {
    /// Regex a webhook URL must match before the dispatcher will use it.
    #[serde(default = "default_allow_pattern")]
    pub allow_pattern: String,
}

impl Default for WebhookPolicyConfig {
    fn default() -> Self {
        Self {
            allow_pattern: default_allow_pattern(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.redwatch/redwatch.db", home)
}
fn default_interval_minutes() -> u64 {
    60
}
fn default_retention_days() -> i64 {
    90
}
fn default_feed_limit() -> u32 {
    100
}
fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; Redwatch/0.1)".to_string()
}
fn default_allow_pattern() -> String {
    r"^https://discord(?:app)?\.com/api/webhooks/\d+/[\w-]+$".to_string()
}

impl RedwatchConfig {
    /// Load config from a TOML file with REDWATCH_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.redwatch/redwatch.toml
    ///
    /// `POLL_INTERVAL_MINUTES` and `RETENTION_DAYS` are honored as bare
    /// env vars on top of the prefixed overrides.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let mut config: RedwatchConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("REDWATCH_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        if let Ok(v) = std::env::var("POLL_INTERVAL_MINUTES") {
            config.poll.interval_minutes = v
                .parse()
                .map_err(|_| crate::error::CoreError::Config(format!("POLL_INTERVAL_MINUTES must be an integer, got {v:?}")))?;
        }
        if let Ok(v) = std::env::var("RETENTION_DAYS") {
            config.poll.retention_days = v
                .parse()
                .map_err(|_| crate::error::CoreError::Config(format!("RETENTION_DAYS must be an integer, got {v:?}")))?;
        }

        config.check()?;
        Ok(config)
    }

    /// Reject configs the pipeline cannot run with. Called at startup so a
    /// bad deployment fails fast instead of polling with, say, an empty
    /// user agent.
    pub fn check(&self) -> crate::error::Result<()> {
        if self.upstream.user_agent.trim().is_empty() {
            return Err(crate::error::CoreError::Config(
                "upstream.user_agent must not be empty".into(),
            ));
        }
        if self.poll.interval_minutes == 0 {
            return Err(crate::error::CoreError::Config(
                "poll.interval_minutes must be at least 1".into(),
            ));
        }
        if self.poll.retention_days <= 0 {
            return Err(crate::error::CoreError::Config(
                "poll.retention_days must be at least 1".into(),
            ));
        }
        if regex::Regex::new(&self.webhooks.allow_pattern).is_err() {
            return Err(crate::error::CoreError::Config(
                "webhooks.allow_pattern is not a valid regex".into(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.redwatch/redwatch.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = RedwatchConfig::default();
        assert_eq!(cfg.poll.interval_minutes, 60);
        assert_eq!(cfg.poll.retention_days, 90);
        assert_eq!(cfg.poll.feed_limit, 100);
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn empty_user_agent_is_fatal() {
        let mut cfg = RedwatchConfig::default();
        cfg.upstream.user_agent = "  ".into();
        assert!(cfg.check().is_err());
    }

    #[test]
    fn zero_interval_is_fatal() {
        let mut cfg = RedwatchConfig::default();
        cfg.poll.interval_minutes = 0;
        assert!(cfg.check().is_err());
    }

    #[test]
    fn bad_allow_pattern_is_fatal() {
        let mut cfg = RedwatchConfig::default();
        cfg.webhooks.allow_pattern = "(".into();
        assert!(cfg.check().is_err());
    }
}
