#![doc = "notion-site-core: traversal and materialization engine for notion-site."]

//! This crate turns a Notion database tree into a markdown content tree with a JSON
//! front-matter manifest. It holds the data model, the collaborator traits and all the
//! traversal logic; the HTTP client and the CLI live in the `notion-site` crate.
//!
//! # Usage
//! Implement [`contract::ContentApi`] (or use the generated mock), pick a
//! [`contract::Renderer`] such as [`render::MarkdownRenderer`], and call
//! [`synchronise::synchronise`].

pub mod block;
pub mod ci;
pub mod config;
pub mod contract;
pub mod error;
pub mod files;
pub mod manifest;
pub mod model;
pub mod page;
pub mod props;
pub mod render;
pub mod sanitize;
pub mod synchronise;
pub mod users;
