mod common;

use common::{child_database, content_page, folder_page, paragraph, settings_page};
use notion_site_core::config::SiteConfig;
use notion_site_core::contract::{RenderContext, Renderer};
use notion_site_core::error::{PageError, RenderError};
use notion_site_core::files::FileContext;
use notion_site_core::manifest::FrontMatter;
use notion_site_core::page::{PageOutcome, PageProcessor, WorkQueue};
use notion_site_core::props::value;
use notion_site_core::render::MarkdownRenderer;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

/// Writes half a document, then fails.
struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn generate_to(
        &self,
        _ctx: RenderContext<'_>,
        sink: &mut dyn Write,
    ) -> Result<FrontMatter, RenderError> {
        sink.write_all(b"---\ntitle: partial")?;
        Err(RenderError::Other("renderer gave up".into()))
    }
}

#[test]
fn test_child_databases_short_circuit_rendering() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let renderer = MarkdownRenderer::new();
    let processor = PageProcessor::new(&config, &renderer);
    let files = FileContext::root(config.content_dir());
    let mut queue = WorkQueue::new();

    let blocks = vec![
        paragraph("intro", "Some text"),
        child_database("db-1"),
        paragraph("wrap", "").with_children(vec![child_database("db-1"), child_database("db-2")]),
    ];
    let outcome = processor
        .process(
            &content_page("p", "Docs Hub"),
            &blocks,
            &HashMap::new(),
            &files,
            &mut queue,
        )
        .unwrap();

    assert_eq!(outcome, PageOutcome::Container { queued: 2 });
    let queued: Vec<_> = queue.iter().map(|e| e.database_id.as_str()).collect();
    assert_eq!(queued, vec!["db-1", "db-2"]);
    let entry = queue.pop().unwrap();
    assert_eq!(entry.owner_files.folder, PathBuf::from("docs-hub"));
    assert_eq!(entry.owner_props.title, "Docs Hub");
    assert!(
        !config.content_dir().join("docs-hub.md").exists(),
        "container page must not be rendered"
    );
}

#[test]
fn test_position_places_page_in_subfolder() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let renderer = MarkdownRenderer::new();
    let processor = PageProcessor::new(&config, &renderer);
    let files = FileContext::root(config.content_dir()).at(PathBuf::from("guides"));

    let page = content_page("p", "Getting Started")
        .with_property("Position", value::rich_text("Part One/Basics"))
        .with_property("Slug", value::rich_text("start-here"))
        .with_property("Tags", value::multi_select(&["rust", "intro"]))
        .with_property("Date", value::date("2024-03-01"));
    let outcome = processor
        .process(
            &page,
            &[paragraph("b", "Welcome")],
            &HashMap::new(),
            &files,
            &mut WorkQueue::new(),
        )
        .unwrap();

    let fm = outcome.into_front_matter().expect("content page yields a record");
    assert_eq!(fm.title, "Getting Started");
    assert_eq!(fm.slug.as_deref(), Some("start-here"));
    assert_eq!(fm.tags, vec!["rust", "intro"]);
    assert_eq!(fm.date.as_deref(), Some("2024-03-01"));
    assert_eq!(fm.position.as_deref(), Some("Part One/Basics"));

    let file = config
        .content_dir()
        .join("guides/part-one/basics/start-here.md");
    let written = std::fs::read_to_string(&file).expect("page file should exist");
    assert!(written.contains("slug: start-here"));
    assert!(written.ends_with("Welcome\n"));
}

#[test]
fn test_position_without_usable_segments_stays_in_context_folder() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let renderer = MarkdownRenderer::new();
    let processor = PageProcessor::new(&config, &renderer);
    let files = FileContext::root(config.content_dir()).at(PathBuf::from("notes"));

    for (id, position) in [("p1", "/"), ("p2", ".."), ("p3", "???")] {
        let page = content_page(id, &format!("Hello {id}"))
            .with_property("Position", value::rich_text(position));
        let outcome = processor
            .process(&page, &[], &HashMap::new(), &files, &mut WorkQueue::new())
            .unwrap_or_else(|e| panic!("position {position:?} should resolve to the folder: {e}"));

        assert!(matches!(outcome, PageOutcome::Document(_)), "{outcome:?}");
        let file = config.content_dir().join(format!("notes/hello-{id}.md"));
        assert!(file.is_file(), "expected {}", file.display());
    }
}

#[test]
fn test_folder_page_creates_directory_only() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let renderer = MarkdownRenderer::new();
    let processor = PageProcessor::new(&config, &renderer);
    let files = FileContext::root(config.content_dir());

    let outcome = processor
        .process(
            &folder_page("f", "Release Notes"),
            &[paragraph("b", "ignored")],
            &HashMap::new(),
            &files,
            &mut WorkQueue::new(),
        )
        .unwrap();

    assert_eq!(
        outcome,
        PageOutcome::Folder {
            dir: PathBuf::from("release-notes")
        }
    );
    assert!(config.content_dir().join("release-notes").is_dir());
    assert!(!config.content_dir().join("release-notes.md").exists());
}

#[test]
fn test_settings_page_is_returned_untouched() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let renderer = MarkdownRenderer::new();
    let processor = PageProcessor::new(&config, &renderer);
    let files = FileContext::root(config.content_dir());

    let page = settings_page("s", "Site").with_property("Theme", value::select("dark"));
    let outcome = processor
        .process(&page, &[], &HashMap::new(), &files, &mut WorkQueue::new())
        .unwrap();

    let PageOutcome::Settings(record) = outcome else {
        panic!("expected settings outcome, got {outcome:?}");
    };
    assert_eq!(record.page_id, "s");
    assert_eq!(record.properties["Theme"], value::select("dark"));
    assert!(!config.content_dir().exists(), "settings pages touch no files");
}

#[test]
fn test_failed_render_leaves_no_file_behind() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let processor = PageProcessor::new(&config, &BrokenRenderer);
    let files = FileContext::root(config.content_dir());

    let err = processor
        .process(
            &content_page("p", "Doomed"),
            &[],
            &HashMap::new(),
            &files,
            &mut WorkQueue::new(),
        )
        .unwrap_err();

    assert!(matches!(err, PageError::Render(_)), "{err:?}");
    let leftovers: Vec<_> = std::fs::read_dir(config.content_dir())
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "found {leftovers:?}");
}

#[test]
fn test_template_fields_are_merged_into_record() {
    let home = tempdir().unwrap();
    let mut config = SiteConfig::with_defaults(home.path(), "root");
    config.template.name = Some("post".into());
    config
        .template
        .extra
        .insert("og_title".into(), json!("{{title}} | Blog"));
    config.template.extra.insert("comments".into(), json!(true));
    let renderer = MarkdownRenderer::new();
    let processor = PageProcessor::new(&config, &renderer);
    let files = FileContext::root(config.content_dir());

    let outcome = processor
        .process(
            &content_page("p", "Hello"),
            &[],
            &HashMap::new(),
            &files,
            &mut WorkQueue::new(),
        )
        .unwrap();

    let fm = outcome.front_matter().unwrap();
    assert_eq!(fm.template.as_deref(), Some("post"));
    assert_eq!(fm.extra["og_title"], json!("Hello | Blog"));
    assert_eq!(fm.extra["comments"], json!(true));
}
