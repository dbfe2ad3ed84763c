use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;

use crate::model::participant::ParticipantId;

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// The only identity allowed to decide requests.
    pub approver_id: Option<ParticipantId>,
    pub data_dir: PathBuf,
    pub log_dir: String,

    // HTTP reporter
    pub enable_web: bool,
    pub server_addr: String,
    pub rate_health_per_min: u32,

    pub telegram_api_url: String,
    pub poll_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let approver_id = lookup("MANAGER_CHAT_ID")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map(ParticipantId)
                    .with_context(|| format!("MANAGER_CHAT_ID must be a number, got `{}`", raw))
            })
            .transpose()?;

        let web_port: u16 = parse_or(&lookup, "WEB_PORT", 8080)?;

        Ok(Self {
            bot_token,
            approver_id,
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),

            enable_web: lookup("ENABLE_WEB_SERVER")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            server_addr: format!("0.0.0.0:{}", web_port),
            rate_health_per_min: parse_or(&lookup, "RATE_HEALTH_PER_MIN", 120)?,

            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string()),
            poll_timeout_secs: parse_or(&lookup, "POLL_TIMEOUT_SECS", 30)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value `{}`: {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_token_is_set() {
        let config = config(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.approver_id, None);
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert!(!config.enable_web);
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.poll_timeout_secs, 30);
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = config(&[
            ("BOT_TOKEN", "456:def"),
            ("MANAGER_CHAT_ID", " 123456789 "),
            ("DATA_DIR", "/var/lib/ferie"),
            ("ENABLE_WEB_SERVER", "TRUE"),
            ("WEB_PORT", "9090"),
        ])
        .unwrap();

        assert_eq!(config.bot_token, "456:def");
        assert_eq!(config.approver_id, Some(ParticipantId(123456789)));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ferie"));
        assert!(config.enable_web);
        assert_eq!(config.server_addr, "0.0.0.0:9090");
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(config(&[]).is_err());
        assert!(config(&[("TELEGRAM_BOT_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = config(&[("TELEGRAM_BOT_TOKEN", "t"), ("MANAGER_CHAT_ID", "boss")]).unwrap_err();
        assert!(err.to_string().contains("MANAGER_CHAT_ID"));

        let err = config(&[("TELEGRAM_BOT_TOKEN", "t"), ("WEB_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("WEB_PORT"));
    }
}
