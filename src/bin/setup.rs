//! Telegnotion setup wizard.
//!
//! Interactive terminal prompts for the three required secrets; writes
//! `config.toml` to the project root (or `TELEGNOTION_ROOT` when set).
//! Run it with `cargo run --bin setup`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

struct ConfigParams<'a> {
    bot_token: &'a str,
    api_key: &'a str,
    database_id: &'a str,
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let bot_token = p.bot_token;
    let api_key = p.api_key;
    let database_id = p.database_id;

    format!(
        r#"[telegram]
bot_token = "{bot_token}"

[notion]
api_key = "{api_key}"
database_id = "{database_id}"
# base_url = "https://api.notion.com/v1"
"#
    )
}

fn run(project_root: &Path) -> Result<()> {
    println!("=== Telegnotion Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let bot_token = read_line("Telegram bot token: ")?;
    let api_key = read_line("Notion API key: ")?;
    let database_id = read_line("Notion database ID: ")?;

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        api_key: &api_key,
        database_id: &database_id,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run");
    Ok(())
}

fn main() -> Result<()> {
    let project_root =
        PathBuf::from(std::env::var("TELEGNOTION_ROOT").unwrap_or_else(|_| ".".to_string()));
    run(&project_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(bot_token: &str, api_key: &str, database_id: &str) -> String {
        format_config(&ConfigParams {
            bot_token,
            api_key,
            database_id,
        })
    }

    #[test]
    fn test_telegram_section_present() {
        let out = cfg("123:abc", "secret", "db");
        assert!(out.contains("[telegram]"));
        assert!(out.contains(r#"bot_token = "123:abc""#));
    }

    #[test]
    fn test_notion_section_present() {
        let out = cfg("t", "ntn-key", "d4ta1d");
        assert!(out.contains("[notion]"));
        assert!(out.contains(r#"api_key = "ntn-key""#));
        assert!(out.contains(r#"database_id = "d4ta1d""#));
    }

    #[test]
    fn test_base_url_left_commented() {
        let out = cfg("t", "k", "d");
        assert!(out.contains("# base_url ="));
        assert!(!out.contains("\nbase_url = "));
    }

    #[test]
    fn test_output_parses_as_toml() {
        let out = cfg("123:abc", "secret", "db");
        let value: toml::Value = toml::from_str(&out).expect("valid toml");
        assert_eq!(value["telegram"]["bot_token"].as_str(), Some("123:abc"));
        assert_eq!(value["notion"]["database_id"].as_str(), Some("db"));
    }
}
