// Runtime configuration, read from the environment (and `.env` via dotenv).

use crate::core::ai::AiConfig;
use crate::core::filters::content_filter::{
    ClassifierConfig, DEFAULT_SPAM_THRESHOLD, DEFAULT_SUSPICIOUS_REACTION,
    DEFAULT_SUSPICIOUS_THRESHOLD,
};
use crate::core::moderation::ResponsePolicy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminProvider {
    /// Telegram chat administrators
    Chat,
    /// Community members API
    Members,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub proxy_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub data_path: PathBuf,
    /// `None` disables the content filter
    pub openai: Option<OpenAiSettings>,
    pub prompt_file: Option<PathBuf>,
    pub classifier: ClassifierConfig,
    pub policy: ResponsePolicy,
    pub reputation_max_age: chrono::Duration,
    pub reputation_refresh: Duration,
    pub reputation_api_url: String,
    pub reputation_lists_url: Option<String>,
    pub reputation_list_name: String,
    pub admin_cache_ttl: Duration,
    pub admin_provider: AdminProvider,
    pub members_api_url: Option<String>,
    pub members_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let telegram_token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let openai = get("OPENAI_API_KEY").map(|api_key| OpenAiSettings {
            api_key,
            base_url: or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            proxy_url: get("OPENAI_PROXY_URL"),
        });

        let classifier = ClassifierConfig {
            ai: AiConfig {
                model: or("OPENAI_MODEL", "gpt-4o-mini"),
                ..AiConfig::default()
            },
            spam_threshold: parse_or(&get, "SPAM_THRESHOLD", DEFAULT_SPAM_THRESHOLD)?,
            suspicious_threshold: parse_or(&get, "SUSPICIOUS_THRESHOLD", DEFAULT_SUSPICIOUS_THRESHOLD)?,
            suspicious_reaction: or("SUSPICIOUS_REACTION", DEFAULT_SUSPICIOUS_REACTION),
            ..ClassifierConfig::default()
        };

        let policy = ResponsePolicy {
            ban_delay: Duration::from_secs(parse_or(&get, "BAN_DELAY_SECS", 600)?),
            notice_delete_delay: Duration::from_secs(parse_or(&get, "NOTICE_DELETE_DELAY_SECS", 30)?),
        };

        let admin_provider = match get("ADMIN_PROVIDER").as_deref() {
            None | Some("chat") => AdminProvider::Chat,
            Some("members") => AdminProvider::Members,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "ADMIN_PROVIDER",
                    value: other.to_string(),
                })
            }
        };
        let members_api_url = get("MEMBERS_API_URL");
        let members_api_key = get("MEMBERS_API_KEY");
        if admin_provider == AdminProvider::Members {
            if members_api_url.is_none() {
                return Err(ConfigError::Missing("MEMBERS_API_URL"));
            }
            if members_api_key.is_none() {
                return Err(ConfigError::Missing("MEMBERS_API_KEY"));
            }
        }

        Ok(Self {
            telegram_token,
            telegram_api_url: or("TELEGRAM_API_URL", "https://api.telegram.org"),
            data_path: PathBuf::from(or("DATA_PATH", "data")),
            openai,
            prompt_file: get("OPENAI_PROMPT_FILE").map(PathBuf::from),
            classifier,
            policy,
            reputation_max_age: chrono::Duration::hours(parse_or(&get, "REPUTATION_MAX_AGE_HOURS", 72)?),
            reputation_refresh: Duration::from_secs(parse_or(&get, "REPUTATION_REFRESH_SECS", 3600)?),
            reputation_api_url: or("REPUTATION_API_URL", "https://api.lols.bot"),
            reputation_lists_url: get("REPUTATION_LISTS_URL"),
            reputation_list_name: or("REPUTATION_LIST_NAME", "spam"),
            admin_cache_ttl: Duration::from_secs(parse_or(&get, "ADMIN_CACHE_TTL_SECS", 60)?),
            admin_provider,
            members_api_url,
            members_api_key,
        })
    }

    /// Path of the persisted moderation state.
    pub fn state_file(&self) -> PathBuf {
        self.data_path.join("config.json")
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
