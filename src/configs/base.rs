use serde::{Deserialize, Serialize};

use crate::common::types::AnyResult;
use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub player: PlayerConfig,
  #[serde(default)]
  pub lyrics: LyricsConfig,
  #[serde(default)]
  pub sources: SourcesConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

impl Config {
  pub fn load() -> AnyResult<Self> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err("config.toml or config.default.toml not found".into());
    };

    crate::log_println!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    Self::parse(&config_str).map_err(|e| format!("{}: {}", config_path, e).into())
  }

  pub fn parse(config_str: &str) -> AnyResult<Self> {
    if config_str.trim().is_empty() {
      return Err("configuration is empty".into());
    }
    let config: Config = toml::from_str(config_str)?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_config_uses_defaults() {
    let config = Config::parse(
      r#"
        [player]
        idle_timeout_secs = 120

        [logging]
        level = "debug"
      "#,
    )
    .unwrap();

    assert_eq!(config.player.idle_timeout_secs, 120);
    assert_eq!(config.player.transport_timeout_ms, 5000);
    assert_eq!(config.player.queue_page_size, 10);
    assert_eq!(config.lyrics.ttl_secs, 3600);
    assert!(config.lyrics.lrclib);
    assert_eq!(config.sources.search_limit, 5);
    assert!(config.sources.deezer);
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert!(config.logging.file.is_none());
  }

  #[test]
  fn test_log_file_section() {
    let config = Config::parse(
      r#"
        [logging.file]
        path = "./logs/guildplay.log"
      "#,
    )
    .unwrap();

    let file = config.logging.file.unwrap();
    assert_eq!(file.path, "./logs/guildplay.log");
    assert_eq!(file.max_lines, 10_000);
  }

  #[test]
  fn test_empty_config_is_rejected() {
    assert!(Config::parse("   \n").is_err());
  }
}
