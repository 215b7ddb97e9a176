//! Configuration types.
//!
//! Everything comes from environment variables (a `.env` file is loaded
//! into the environment by `main` before this runs).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Posts fetched per poll cycle.
pub const DEFAULT_PAGE_SIZE: usize = 5;
/// Delivery queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SEND_DELAY_SECS: u64 = 10;
pub const DEFAULT_STORE_PATH: &str = "store.db";
pub const DEFAULT_MESSAGE_BASE_URL: &str = "https://www.reddit.com/";

/// Settings for the poll → queue → send pipeline itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Subreddit to watch; also the watermark key.
    pub source_name: String,
    /// Telegram chat that receives the posts.
    pub chat_id: i64,
    pub page_size: usize,
    pub queue_capacity: usize,
    pub poll_interval: Duration,
    /// Pause after every send attempt.
    pub send_delay: Duration,
    /// Prefix joined with each post's permalink.
    pub message_base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_name: String::new(),
            chat_id: 0,
            page_size: DEFAULT_PAGE_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            send_delay: Duration::from_secs(DEFAULT_SEND_DELAY_SECS),
            message_base_url: DEFAULT_MESSAGE_BASE_URL.to_string(),
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub pipeline: PipelineConfig,
    pub bot_token: SecretString,
    pub user_agent: String,
    pub store_path: PathBuf,
    /// Directory for rolling log files; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl RelayConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.into()));

        let source_name = require("SUBREDDIT")?;
        let chat_id: i64 = parse_value("CHAT_ID", &require("CHAT_ID")?)?;
        let bot_token = SecretString::from(require("TG_BOT_TOKEN")?);

        let page_size = optional(&get, "RELAY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let queue_capacity = optional(&get, "RELAY_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        for (key, value) in [
            ("RELAY_PAGE_SIZE", page_size),
            ("RELAY_QUEUE_CAPACITY", queue_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be greater than zero".into(),
                });
            }
        }

        let poll_interval_secs: u64 =
            optional(&get, "RELAY_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_POLL_INTERVAL_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }
        let send_delay_secs: u64 = optional(&get, "RELAY_SEND_DELAY_SECS", DEFAULT_SEND_DELAY_SECS)?;

        let message_base_url =
            get("RELAY_MESSAGE_BASE_URL").unwrap_or_else(|| DEFAULT_MESSAGE_BASE_URL.to_string());
        let user_agent = get("REDDIT_USER_AGENT")
            .unwrap_or_else(|| format!("reddit-relay/{}", env!("CARGO_PKG_VERSION")));
        let store_path = get("RELAY_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        let log_dir = get("RELAY_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            pipeline: PipelineConfig {
                source_name,
                chat_id,
                page_size,
                queue_capacity,
                poll_interval: Duration::from_secs(poll_interval_secs),
                send_delay: Duration::from_secs(send_delay_secs),
                message_base_url,
            },
            bot_token,
            user_agent,
            store_path,
            log_dir,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

fn optional<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SUBREDDIT", "rust"),
        ("CHAT_ID", "-1001234567890"),
        ("TG_BOT_TOKEN", "123:ABC"),
    ];

    #[test]
    fn required_only_uses_defaults() {
        let config = RelayConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.pipeline.source_name, "rust");
        assert_eq!(config.pipeline.chat_id, -1_001_234_567_890);
        assert_eq!(config.bot_token.expose_secret(), "123:ABC");
        assert_eq!(config.pipeline.page_size, 5);
        assert_eq!(config.pipeline.queue_capacity, 100);
        assert_eq!(config.pipeline.poll_interval, Duration::from_secs(60));
        assert_eq!(config.pipeline.send_delay, Duration::from_secs(10));
        assert_eq!(config.pipeline.message_base_url, "https://www.reddit.com/");
        assert_eq!(config.store_path, PathBuf::from("store.db"));
        assert!(config.user_agent.starts_with("reddit-relay/"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("RELAY_PAGE_SIZE", "25"),
            ("RELAY_QUEUE_CAPACITY", "3"),
            ("RELAY_POLL_INTERVAL_SECS", "30"),
            ("RELAY_SEND_DELAY_SECS", "0"),
            ("RELAY_STORE_PATH", "/var/lib/relay/wm.db"),
            ("REDDIT_USER_AGENT", "linux:relay:v1 (by /u/someone)"),
            ("RELAY_LOG_DIR", "/var/log/relay"),
        ]);
        let config = RelayConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.pipeline.page_size, 25);
        assert_eq!(config.pipeline.queue_capacity, 3);
        assert_eq!(config.pipeline.poll_interval, Duration::from_secs(30));
        assert_eq!(config.pipeline.send_delay, Duration::ZERO);
        assert_eq!(config.store_path, PathBuf::from("/var/lib/relay/wm.db"));
        assert_eq!(config.user_agent, "linux:relay:v1 (by /u/someone)");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/relay")));
    }

    #[test]
    fn missing_token_is_fatal() {
        let pairs = [("SUBREDDIT", "rust"), ("CHAT_ID", "42")];
        let err = RelayConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "TG_BOT_TOKEN"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let pairs = [("SUBREDDIT", "  "), ("CHAT_ID", "42"), ("TG_BOT_TOKEN", "t")];
        let err = RelayConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "SUBREDDIT"));
    }

    #[test]
    fn unparsable_chat_id_is_fatal() {
        let pairs = [("SUBREDDIT", "rust"), ("CHAT_ID", "@channel"), ("TG_BOT_TOKEN", "t")];
        let err = RelayConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CHAT_ID"));
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RELAY_QUEUE_CAPACITY", "0"));
        let err = RelayConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "RELAY_QUEUE_CAPACITY")
        );
    }

    #[test]
    fn non_numeric_interval_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RELAY_POLL_INTERVAL_SECS", "1m"));
        assert!(RelayConfig::from_lookup(lookup(&pairs)).is_err());
    }
}
