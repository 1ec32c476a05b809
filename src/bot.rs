use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::FileMeta;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::notion::NotionClient;
use crate::record::{self, FileKind};

// User-facing replies stay in French, verbatim. Logs stay in English.
const START_REPLY: &str = "Bonjour ! Envoyez-moi du texte, une image ou un document, et je le sauvegarderai dans votre base de données Notion.";
const TEXT_ACK: &str = "Traitement du texte...";
const PHOTO_ACK: &str = "Traitement de l'image...";
const DOCUMENT_ACK: &str = "Traitement du document...";
const TEXT_SAVED: &str = "Texte sauvegardé dans Notion !";
const PHOTO_SAVED: &str = "Image sauvegardée dans Notion !";
const SAVE_FAILED: &str = "Oups ! Une erreur s'est produite lors de la sauvegarde dans Notion.";
const INTERNAL_ERROR: &str = "Désolé, une erreur interne est survenue.";

/// Shared application state
pub struct AppState {
    notion: NotionClient,
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let notion = NotionClient::new(config.notion.clone())?;
        Ok(Self { notion, config })
    }
}

/// Start the Telegram bot
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.telegram.bot_token);

    info!("Starting Telegram bot...");

    let handler = Update::filter_message()
        .branch(
            dptree::filter(|msg: Message| {
                msg.text().map(is_start_command).unwrap_or(false)
            })
            .endpoint(handle_start),
        )
        .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo))
        .branch(dptree::filter(|msg: Message| msg.document().is_some()).endpoint(handle_document))
        .branch(
            dptree::filter(|msg: Message| msg.text().map(is_plain_text).unwrap_or(false))
                .endpoint(handle_text),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_start(bot: Bot, msg: Message) -> ResponseResult<()> {
    info!("Start command from {}", sender(&msg));
    bot.send_message(msg.chat.id, START_REPLY).await?;
    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Err(e) = process_text(&bot, &msg, &state).await {
        report_handler_error(&bot, &msg, e).await;
    }
    Ok(())
}

async fn handle_photo(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Err(e) = process_photo(&bot, &msg, &state).await {
        report_handler_error(&bot, &msg, e).await;
    }
    Ok(())
}

async fn handle_document(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Err(e) = process_document(&bot, &msg, &state).await {
        report_handler_error(&bot, &msg, e).await;
    }
    Ok(())
}

async fn process_text(bot: &Bot, msg: &Message, state: &AppState) -> Result<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    info!("Text message from {}: {}", sender(msg), text);

    bot.send_message(msg.chat.id, TEXT_ACK).await?;

    let properties = record::text_properties(text);
    let reply = if state.notion.save_page(&properties).await {
        TEXT_SAVED
    } else {
        SAVE_FAILED
    };
    bot.send_message(msg.chat.id, reply).await?;

    Ok(())
}

async fn process_photo(bot: &Bot, msg: &Message, state: &AppState) -> Result<()> {
    // Telegram delivers several resolutions; the last one is the largest.
    let photo = match msg.photo().and_then(|sizes| sizes.last()) {
        Some(p) => p,
        None => return Ok(()),
    };

    info!("Photo from {}", sender(msg));

    bot.send_message(msg.chat.id, PHOTO_ACK).await?;

    let file_url = resolve_file_url(bot, &photo.file).await?;
    let properties = record::file_properties(&file_url, FileKind::Image, None);
    let reply = if state.notion.save_page(&properties).await {
        PHOTO_SAVED
    } else {
        SAVE_FAILED
    };
    bot.send_message(msg.chat.id, reply).await?;

    Ok(())
}

async fn process_document(bot: &Bot, msg: &Message, state: &AppState) -> Result<()> {
    let document = match msg.document() {
        Some(d) => d,
        None => return Ok(()),
    };

    info!(
        "Document from {}: {}",
        sender(msg),
        document.file_name.as_deref().unwrap_or("<unnamed>")
    );

    bot.send_message(msg.chat.id, DOCUMENT_ACK).await?;

    let file_url = resolve_file_url(bot, &document.file).await?;
    let properties =
        record::file_properties(&file_url, FileKind::Document, document.file_name.as_deref());
    let reply = if state.notion.save_page(&properties).await {
        let name = document.file_name.as_deref().unwrap_or("document");
        format!("Document '{name}' sauvegardé dans Notion !")
    } else {
        SAVE_FAILED.to_string()
    };
    bot.send_message(msg.chat.id, reply).await?;

    Ok(())
}

/// Last line of defense for a handler: log the error and try to tell the
/// user something went wrong. A failure of that reply is only logged.
async fn report_handler_error(bot: &Bot, msg: &Message, err: anyhow::Error) {
    error!("Unhandled error in message handler: {:#}", err);
    if let Err(send_err) = bot.send_message(msg.chat.id, INTERNAL_ERROR).await {
        error!("Failed to notify user about the error: {}", send_err);
    }
}

/// Resolve a Telegram file to the temporary download URL the Bot API serves
/// it from. The URL embeds the bot token and expires after a while.
async fn resolve_file_url(bot: &Bot, file: &FileMeta) -> Result<String> {
    let file = bot
        .get_file(file.id.clone())
        .await
        .context("Failed to resolve file on Telegram")?;
    Ok(file_download_url(bot.token(), &file.path))
}

fn file_download_url(token: &str, path: &str) -> String {
    format!("https://api.telegram.org/file/bot{token}/{path}")
}

fn sender(msg: &Message) -> String {
    match msg.from.as_ref() {
        Some(user) => format!("{} ({})", user.first_name, user.id.0),
        None => "unknown sender".to_string(),
    }
}

fn is_start_command(text: &str) -> bool {
    text == "/start" || text.starts_with("/start ") || text.starts_with("/start@")
}

fn is_plain_text(text: &str) -> bool {
    !text.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_command_matching() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start again"));
        assert!(is_start_command("/start@telegnotion_bot"));

        assert!(!is_start_command("/starting"));
        assert!(!is_start_command("start"));
        assert!(!is_start_command("Bonjour"));
    }

    #[test]
    fn test_plain_text_excludes_commands() {
        assert!(is_plain_text("Hello world"));
        assert!(is_plain_text("a/b is a path"));

        assert!(!is_plain_text("/start"));
        assert!(!is_plain_text("/unknown"));
    }

    #[test]
    fn test_file_download_url_embeds_token_and_path() {
        assert_eq!(
            file_download_url("123:abc", "documents/file_0.pdf"),
            "https://api.telegram.org/file/bot123:abc/documents/file_0.pdf"
        );
    }
}
