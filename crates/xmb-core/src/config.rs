use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly social media assistant. \
Reply to the mention below in one short, helpful sentence. \
Do not use hashtags. Keep it under 200 characters.";

/// Runtime behavior of the mention bot.
///
/// Created with defaults at process start (`enabled = false`), replaced
/// wholesale by `MentionBot::configure`, and read by every polling cycle.
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub enabled: bool,
    pub poll_interval: Duration,
    pub max_mentions_per_cycle: u32,
    pub reply_prefix: Option<String>,
    pub use_augmented_reply: bool,
    pub system_prompt: String,
    pub max_reply_length: usize,
    pub suppress_duplicates: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval: Duration::from_secs(120),
            max_mentions_per_cycle: 5,
            reply_prefix: None,
            use_augmented_reply: false,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_reply_length: 280,
            suppress_duplicates: true,
        }
    }
}

impl BotConfig {
    /// Reject configurations the worker cannot safely run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval < Duration::from_secs(1) {
            return Err(Error::Config(
                "poll_interval must be at least 1 second".to_string(),
            ));
        }
        if self.max_mentions_per_cycle == 0 {
            return Err(Error::Config(
                "max_mentions_per_cycle must be at least 1".to_string(),
            ));
        }
        if self.max_reply_length == 0 {
            return Err(Error::Config(
                "max_reply_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Process-level configuration, loaded from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// OAuth2 user-context bearer token for the X API v2.
    pub x_bearer_token: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Initial `BotConfig`; the control plane may replace it at runtime.
    pub bot: BotConfig,
    /// Enable the polling worker immediately at startup.
    pub bot_autostart: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let x_bearer_token = env_str("X_BEARER_TOKEN").unwrap_or_default();
        if x_bearer_token.trim().is_empty() {
            return Err(Error::Config(
                "X_BEARER_TOKEN environment variable is required".to_string(),
            ));
        }

        let openai_api_key = env_str("OPENAI_API_KEY").and_then(non_empty);
        let openai_model = env_str("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let mut bot = BotConfig::default();
        if let Some(secs) = env_u64("XMB_POLL_INTERVAL_SECS") {
            bot.poll_interval = Duration::from_secs(secs);
        }
        if let Some(n) = env_u32("XMB_MAX_MENTIONS_PER_CYCLE") {
            bot.max_mentions_per_cycle = n;
        }
        bot.reply_prefix = env_str("XMB_REPLY_PREFIX").and_then(non_empty);
        if let Some(v) = env_bool("XMB_USE_AUGMENTED_REPLY") {
            bot.use_augmented_reply = v;
        }
        if let Some(p) = env_str("XMB_SYSTEM_PROMPT").and_then(non_empty) {
            bot.system_prompt = p;
        }
        if let Some(n) = env_usize("XMB_MAX_REPLY_LENGTH") {
            bot.max_reply_length = n;
        }
        if let Some(v) = env_bool("XMB_SUPPRESS_DUPLICATES") {
            bot.suppress_duplicates = v;
        }
        bot.validate()?;

        let bot_autostart = env_bool("XMB_BOT_AUTOSTART").unwrap_or(false);

        Ok(Self {
            x_bearer_token,
            openai_api_key,
            openai_model,
            bot,
            bot_autostart,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key)?.trim().parse().ok()
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key)?.trim().parse().ok()
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key)?.trim().parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    match env_str(key)?.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }
        env::set_var(key, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_disabled_and_valid() {
        let cfg = BotConfig::default();
        assert!(!cfg.enabled);
        assert!(cfg.suppress_duplicates);
        assert_eq!(cfg.max_reply_length, 280);
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_sub_second_interval() {
        let cfg = BotConfig {
            poll_interval: Duration::from_millis(200),
            ..BotConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_batch_and_length() {
        let cfg = BotConfig {
            max_mentions_per_cycle: 0,
            ..BotConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = BotConfig {
            max_reply_length: 0,
            ..BotConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
