use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub notion: NotionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
}

fn default_notion_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    // An empty secret is as fatal as a missing one; the bot must not start
    // half-configured.
    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token is not set");
        }
        if self.notion.api_key.trim().is_empty() {
            anyhow::bail!("notion.api_key is not set");
        }
        if self.notion.database_id.trim().is_empty() {
            anyhow::bail!("notion.database_id is not set");
        }
        Ok(())
    }
}
