//! Builds Notion page properties out of incoming Telegram messages.

use std::fmt;

use chrono::Local;

use crate::notion::{
    PageProperties, RichTextProperty, SelectProperty, TitleProperty, UrlProperty,
};

/// Titles of text records keep only the start of the message; the full text
/// lives in the Contenu property.
const TEXT_TITLE_CHARS: usize = 30;
const FILE_TITLE_CHARS: usize = 100;

/// The two kinds of file attachments the bot accepts. The label doubles as
/// the select option in the database, which only knows these exact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Document,
}

impl FileKind {
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Image => "Image",
            FileKind::Document => "Document",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Properties for a plain text message: truncated title, "Texte" type and
/// the untruncated text in Contenu.
pub fn text_properties(text: &str) -> PageProperties {
    PageProperties {
        name: TitleProperty::new(truncate_chars(text, TEXT_TITLE_CHARS)),
        record_type: SelectProperty::new("Texte"),
        contenu: Some(RichTextProperty::new(text)),
        fichier_url: None,
    }
}

/// Properties for a file attachment. The title is "{kind}: {filename}", with
/// a local timestamp standing in when Telegram carries no filename.
pub fn file_properties(
    file_url: &str,
    kind: FileKind,
    filename: Option<&str>,
) -> PageProperties {
    let label = match filename {
        Some(name) => name.to_string(),
        None => Local::now().format("%Y-%m-%d_%H-%M-%S").to_string(),
    };

    PageProperties {
        name: TitleProperty::new(truncate_chars(
            &format!("{kind}: {label}"),
            FILE_TITLE_CHARS,
        )),
        record_type: SelectProperty::new(kind.label()),
        contenu: None,
        fichier_url: Some(UrlProperty::new(file_url)),
    }
}

// Char-wise so a cut never lands inside a multi-byte sequence.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
