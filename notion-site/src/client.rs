//! # Notion HTTP client
//!
//! [`NotionClient`] implements the core [`ContentApi`] contract against the public Notion
//! REST API. It owns transport, authentication and pagination; the traversal engine only
//! sees fully materialized pages, block trees and users.
//!
//! - Construct with [`NotionClient::new_from_env`], which reads the integration secret from
//!   `NOTION_SECRET`. Loading `.env` is left to the binary.
//! - Every request carries the bearer secret and the pinned `Notion-Version` header.
//! - List endpoints are drained with `start_cursor` until `has_more` is false.
//!
//! The request bodies are built by free functions ([`database_filter`], [`query_body`],
//! [`status_update_body`]) so they can be checked without a network.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::env;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use notion_site_core::block::{Block, BlockKind};
use notion_site_core::config::NotionConfig;
use notion_site_core::contract::{ApiError, ContentApi};
use notion_site_core::model::{Page, User};
use notion_site_core::props::select_name;

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
/// Environment variable holding the integration secret.
pub const SECRET_ENV: &str = "NOTION_SECRET";
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("NOTION_SECRET is not set")]
    MissingSecret,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notion api returned {status}: {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },
    #[error("database {database_id} has no property {property:?}")]
    MissingProperty {
        database_id: String,
        property: String,
    },
}

/// One page of a paginated list endpoint.
#[derive(Debug, Deserialize)]
struct List<T> {
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseSchema {
    #[serde(default)]
    properties: Map<String, Value>,
}

pub struct NotionClient {
    http: Client,
    base_url: String,
    secret: String,
}

impl NotionClient {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: NOTION_API_BASE.to_string(),
            secret: secret.into(),
        }
    }

    /// Points the client at another API root, e.g. a recording proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads the secret from the process environment only; `main` loads `.env` beforehand.
    pub fn new_from_env() -> Result<Self, NotionError> {
        match env::var(SECRET_ENV) {
            Ok(secret) if !secret.trim().is_empty() => {
                info!(secret_set = true, base_url = NOTION_API_BASE, "Initialized NotionClient from environment");
                Ok(Self::new(secret.trim()))
            }
            _ => {
                error!("{SECRET_ENV} missing in environment");
                Err(NotionError::MissingSecret)
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.secret)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Sends a request and decodes a successful JSON response; API errors carry Notion's
    /// error code and message.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, NotionError> {
        let resp = self.authorize(builder).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body: ErrorBody = resp.json().await.unwrap_or_default();
            return Err(NotionError::Status {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            });
        }
        Ok(resp.json::<T>().await?)
    }

    /// Type (`status`, `select`, ...) of a database property, read from the schema.
    async fn property_type(&self, database_id: &str, property: &str) -> Result<String, NotionError> {
        let schema: DatabaseSchema = self
            .send(self.http.get(self.url(&format!("databases/{database_id}"))))
            .await?;
        schema
            .properties
            .get(property)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| NotionError::MissingProperty {
                database_id: database_id.to_string(),
                property: property.to_string(),
            })
    }

    /// All direct children of a block, across every result page.
    async fn children(&self, block_id: &str) -> Result<Vec<Block>, NotionError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query = vec![("page_size", PAGE_SIZE.to_string())];
            if let Some(c) = &cursor {
                query.push(("start_cursor", c.clone()));
            }
            let list: List<Block> = self
                .send(
                    self.http
                        .get(self.url(&format!("blocks/{block_id}/children")))
                        .query(&query),
                )
                .await?;
            blocks.extend(list.results);
            match list.next_cursor {
                Some(next) if list.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(blocks)
    }

    /// Children of `block_id` with every nested level filled in. Sub-pages and nested
    /// databases are not descended into: their content belongs to them.
    fn block_tree<'a>(&'a self, block_id: &'a str) -> BoxFuture<'a, Result<Vec<Block>, NotionError>> {
        async move {
            let mut blocks = self.children(block_id).await?;
            for block in blocks.iter_mut() {
                if block.has_children && descends(block.kind) {
                    block.children = self.block_tree(&block.id).await?;
                }
            }
            Ok(blocks)
        }
        .boxed()
    }
}

fn descends(kind: BlockKind) -> bool {
    !matches!(kind, BlockKind::ChildPage | BlockKind::ChildDatabase)
}

/// Filter selecting pages whose `filter_prop` equals one of `filter_value`. `None` when no
/// values are configured.
pub fn database_filter(config: &NotionConfig, property_type: &str) -> Option<Value> {
    let mut conditions: Vec<Value> = config
        .filter_value
        .iter()
        .map(|value| {
            json!({
                "property": config.filter_prop,
                property_type: { "equals": value },
            })
        })
        .collect();
    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(json!({ "or": conditions })),
    }
}

pub fn query_body(filter: Option<&Value>, cursor: Option<&str>) -> Value {
    let mut body = json!({ "page_size": PAGE_SIZE });
    if let Some(filter) = filter {
        body["filter"] = filter.clone();
    }
    if let Some(cursor) = cursor {
        body["start_cursor"] = Value::from(cursor);
    }
    body
}

/// PATCH body marking `page` as published. `None` when no published value is configured,
/// the page lacks a status or select `filter_prop`, or the page is already published.
pub fn status_update_body(page: &Page, config: &NotionConfig) -> Option<Value> {
    if config.published_value.is_empty() {
        return None;
    }
    let property = page.properties.get(&config.filter_prop)?;
    let kind = property.get("type").and_then(Value::as_str)?;
    if !matches!(kind, "status" | "select") {
        return None;
    }
    if select_name(property).as_deref() == Some(config.published_value.as_str()) {
        return None;
    }
    Some(json!({
        "properties": {
            (config.filter_prop.as_str()): { kind: { "name": config.published_value } }
        }
    }))
}

#[async_trait]
impl ContentApi for NotionClient {
    async fn query_database(
        &self,
        config: &NotionConfig,
        database_id: &str,
    ) -> Result<Vec<Page>, ApiError> {
        let filter = if config.filter_value.is_empty() {
            None
        } else {
            let kind = self.property_type(database_id, &config.filter_prop).await?;
            database_filter(config, &kind)
        };
        debug!(database_id, ?filter, "Querying database");

        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let body = query_body(filter.as_ref(), cursor.as_deref());
            let list: List<Page> = self
                .send(
                    self.http
                        .post(self.url(&format!("databases/{database_id}/query")))
                        .json(&body),
                )
                .await?;
            pages.extend(list.results);
            match list.next_cursor {
                Some(next) if list.has_more => cursor = Some(next),
                _ => break,
            }
        }
        info!(database_id, pages = pages.len(), "Fetched database pages");
        Ok(pages)
    }

    async fn query_block_children(&self, block_id: &str) -> Result<Vec<Block>, ApiError> {
        Ok(self.block_tree(block_id).await?)
    }

    async fn query_user(&self, user_id: &str) -> Result<User, ApiError> {
        Ok(self
            .send(self.http.get(self.url(&format!("users/{user_id}"))))
            .await?)
    }

    async fn change_status(&self, page: &Page, config: &NotionConfig) -> bool {
        let Some(body) = status_update_body(page, config) else {
            debug!(page_id = %page.id, "Status unchanged: already published or not configured");
            return false;
        };
        let result: Result<Value, NotionError> = self
            .send(
                self.http
                    .patch(self.url(&format!("pages/{}", page.id)))
                    .json(&body),
            )
            .await;
        match result {
            Ok(_) => {
                info!(page_id = %page.id, status = %config.published_value, "Page status updated");
                true
            }
            Err(e) => {
                warn!(page_id = %page.id, error = %e, "Updating page status failed");
                false
            }
        }
    }
}
