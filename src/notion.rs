//! Minimal Notion client: one page-creation call against a fixed database.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::NotionConfig;

const NOTION_VERSION: &str = "2022-06-28";

/// Properties of a single page in the target database. Field names are part
/// of the remote schema and serialized exactly as Notion expects them.
#[derive(Debug, Clone, Serialize)]
pub struct PageProperties {
    #[serde(rename = "Name")]
    pub name: TitleProperty,
    #[serde(rename = "Type")]
    pub record_type: SelectProperty,
    #[serde(rename = "Contenu", skip_serializing_if = "Option::is_none")]
    pub contenu: Option<RichTextProperty>,
    #[serde(rename = "Fichier URL", skip_serializing_if = "Option::is_none")]
    pub fichier_url: Option<UrlProperty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleProperty {
    title: Vec<TitleText>,
}

impl TitleProperty {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            title: vec![TitleText {
                text: TextContent {
                    content: content.into(),
                },
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct TitleText {
    text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectProperty {
    select: SelectOption,
}

impl SelectProperty {
    pub fn new(name: &'static str) -> Self {
        Self {
            select: SelectOption { name },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SelectOption {
    name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RichTextProperty {
    rich_text: Vec<RichTextItem>,
}

impl RichTextProperty {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            rich_text: vec![RichTextItem {
                item_type: "text",
                text: TextContent {
                    content: content.into(),
                },
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RichTextItem {
    #[serde(rename = "type")]
    item_type: &'static str,
    text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlProperty {
    url: String,
}

impl UrlProperty {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
struct TextContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct CreatePageRequest<'a> {
    parent: Parent<'a>,
    properties: &'a PageProperties,
}

#[derive(Debug, Serialize)]
struct Parent<'a> {
    database_id: &'a str,
}

pub struct NotionClient {
    client: reqwest::Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(config: NotionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .context("Failed to build HTTP client for Notion")?;

        Ok(Self { client, config })
    }

    /// Create one page in the configured database. The call is made exactly
    /// once; a non-success status surfaces as an error carrying the HTTP
    /// status and the raw response body.
    pub async fn create_page(&self, properties: &PageProperties) -> Result<()> {
        let url = format!("{}/pages", self.config.base_url);

        let request = CreatePageRequest {
            parent: Parent {
                database_id: &self.config.database_id,
            },
            properties,
        };

        debug!("Creating page in Notion database {}", self.config.database_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Notion-Version", NOTION_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Notion")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Notion API error ({}): {}", status, error_body);
        }

        Ok(())
    }

    /// Forwarding contract used by the handlers: true when the page was
    /// created, false on any failure. The error is fully logged here and
    /// never retried.
    pub async fn save_page(&self, properties: &PageProperties) -> bool {
        match self.create_page(properties).await {
            Ok(()) => {
                info!("Page created in Notion");
                true
            }
            Err(e) => {
                error!("Failed to save page to Notion: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{self, FileKind};
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> NotionClient {
        NotionClient::new(NotionConfig {
            api_key: "test-key".to_string(),
            database_id: "db-123".to_string(),
            base_url: server.base_url(),
        })
        .expect("client")
    }

    #[tokio::test]
    async fn test_create_page_sends_expected_request() {
        let server = MockServer::start_async().await;

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/pages")
                .header("Authorization", "Bearer test-key")
                .header("Notion-Version", "2022-06-28")
                .json_body(json!({
                    "parent": { "database_id": "db-123" },
                    "properties": {
                        "Name": { "title": [{ "text": { "content": "Hello world" } }] },
                        "Type": { "select": { "name": "Texte" } },
                        "Contenu": {
                            "rich_text": [
                                { "type": "text", "text": { "content": "Hello world" } }
                            ]
                        }
                    }
                }));
            then.status(200)
                .json_body(json!({ "object": "page", "id": "page-1" }));
        });

        let client = test_client(&server);
        let properties = record::text_properties("Hello world");

        client.create_page(&properties).await.expect("page created");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_create_page_sends_file_url_for_documents() {
        let server = MockServer::start_async().await;

        let mock = server.mock(|when, then| {
            when.method(POST).path("/pages").json_body(json!({
                "parent": { "database_id": "db-123" },
                "properties": {
                    "Name": { "title": [{ "text": { "content": "Document: report.pdf" } }] },
                    "Type": { "select": { "name": "Document" } },
                    "Fichier URL": { "url": "https://example/x" }
                }
            }));
            then.status(200)
                .json_body(json!({ "object": "page", "id": "page-2" }));
        });

        let client = test_client(&server);
        let properties =
            record::file_properties("https://example/x", FileKind::Document, Some("report.pdf"));

        client.create_page(&properties).await.expect("page created");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_create_page_surfaces_status_and_body() {
        let server = MockServer::start_async().await;

        let mock = server.mock(|when, then| {
            when.method(POST).path("/pages");
            then.status(400).json_body(json!({
                "object": "error",
                "status": 400,
                "code": "validation_error",
                "message": "Type is not a property that exists."
            }));
        });

        let client = test_client(&server);
        let err = client
            .create_page(&record::text_properties("boom"))
            .await
            .unwrap_err();

        let msg = format!("{err}");
        assert!(msg.contains("400"));
        assert!(msg.contains("validation_error"));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_save_page_true_on_success() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/pages");
            then.status(200)
                .json_body(json!({ "object": "page", "id": "page-3" }));
        });

        let client = test_client(&server);
        assert!(client.save_page(&record::text_properties("ok")).await);
    }

    #[tokio::test]
    async fn test_save_page_false_on_any_remote_error() {
        let server = MockServer::start_async().await;

        let mock = server.mock(|when, then| {
            when.method(POST).path("/pages");
            then.status(500).body("internal failure");
        });

        let client = test_client(&server);
        assert!(!client.save_page(&record::text_properties("nope")).await);
        mock.assert_calls(1);
    }
}
