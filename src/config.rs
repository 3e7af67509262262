//! Configuration loader and validator for the catalog delivery bot.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub telegram: Telegram,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    /// Pause between sequential episode sends, in milliseconds.
    pub episode_pacing_ms: u64,
    /// Optional sticker file id sent after each completed delivery.
    #[serde(default)]
    pub thank_you_sticker: Option<String>,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Telegram {
    pub bot_token: String,
    pub admin_ids: Vec<u64>,
    /// Channel the user must join before using the bot, e.g. "@mychannel".
    #[serde(default)]
    pub force_join_channel: Option<String>,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.telegram.admin_ids.contains(&user_id)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::Invalid("telegram.bot_token must be non-empty"));
    }
    if cfg.telegram.admin_ids.is_empty() {
        return Err(ConfigError::Invalid(
            "telegram.admin_ids must list at least one admin",
        ));
    }
    if let Some(channel) = &cfg.telegram.force_join_channel {
        if !channel.starts_with('@') {
            return Err(ConfigError::Invalid(
                "telegram.force_join_channel must start with '@'",
            ));
        }
    }
    Ok(())
}

/// Example YAML matching the schema above.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  episode_pacing_ms: 500
  thank_you_sticker: null

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  admin_ids:
    - 123456789
  force_join_channel: "@your_channel"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app.episode_pacing_ms, 500);
        assert!(cfg.is_admin(123456789));
        assert!(!cfg.is_admin(5));
    }

    #[test]
    fn invalid_bot_token() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.bot_token = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("bot_token")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_admin_list() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.admin_ids.clear();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_channel_name() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.force_join_channel = Some("mychannel".into());
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn optional_fields_default() {
        let yaml = r#"
app:
  data_dir: "./data"
  episode_pacing_ms: 250
telegram:
  bot_token: "token"
  admin_ids: [1]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert!(cfg.app.thank_you_sticker.is_none());
        assert!(cfg.telegram.force_join_channel.is_none());
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.telegram.admin_ids, vec![123456789]);
    }
}
