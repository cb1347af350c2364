#![allow(dead_code)]

use notion_site_core::block::{Block, BlockKind};
use notion_site_core::model::{Page, User};
use notion_site_core::props::value;
use serde_json::json;

pub fn content_page(id: &str, title: &str) -> Page {
    Page::new(id)
        .with_property("Name", value::title(title))
        .with_property("Status", value::status("Finished"))
        .with_authors("u-alice", "u-alice")
}

pub fn folder_page(id: &str, title: &str) -> Page {
    content_page(id, title).with_property("Type", value::select("Folder"))
}

pub fn settings_page(id: &str, title: &str) -> Page {
    content_page(id, title).with_property("Type", value::select("Settings"))
}

pub fn paragraph(id: &str, text: &str) -> Block {
    Block::new(BlockKind::Paragraph, id)
        .with_payload(json!({ "rich_text": [{ "type": "text", "plain_text": text }] }))
}

pub fn child_database(id: &str) -> Block {
    Block::new(BlockKind::ChildDatabase, id).with_payload(json!({ "title": "Nested" }))
}

pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: Some(name.to_string()),
        ..User::default()
    }
}
