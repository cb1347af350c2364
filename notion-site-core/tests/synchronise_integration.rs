mod common;

use common::{child_database, content_page, folder_page, paragraph, settings_page, user};
use notion_site_core::block::Block;
use notion_site_core::config::SiteConfig;
use notion_site_core::contract::MockContentApi;
use notion_site_core::error::SiteError;
use notion_site_core::model::Page;
use notion_site_core::render::MarkdownRenderer;
use notion_site_core::synchronise::synchronise;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

type Events = Arc<Mutex<Vec<String>>>;

/// Scripted workspace: database id -> pages, page id -> blocks. Unknown ids fail.
struct Workspace {
    databases: HashMap<&'static str, Vec<Page>>,
    blocks: HashMap<&'static str, Vec<Block>>,
}

impl Workspace {
    fn new() -> Self {
        Self {
            databases: HashMap::new(),
            blocks: HashMap::new(),
        }
    }

    fn database(mut self, id: &'static str, pages: Vec<Page>) -> Self {
        self.databases.insert(id, pages);
        self
    }

    fn blocks(mut self, page_id: &'static str, blocks: Vec<Block>) -> Self {
        self.blocks.insert(page_id, blocks);
        self
    }

    /// Mock API serving this workspace and logging every call into `events`.
    fn into_api(self, events: Events) -> MockContentApi {
        let mut api = MockContentApi::new();

        let log = events.clone();
        let databases = self.databases;
        api.expect_query_database().returning(move |_, id| {
            log.lock().unwrap().push(format!("query:{id}"));
            databases
                .get(id)
                .cloned()
                .ok_or_else(|| format!("database {id} not found").into())
        });

        let log = events.clone();
        let blocks = self.blocks;
        api.expect_query_block_children().returning(move |id| {
            log.lock().unwrap().push(format!("blocks:{id}"));
            Ok(blocks.get(id).cloned().unwrap_or_default())
        });

        api.expect_query_user()
            .returning(|id| Ok(user(id, "Alice")));

        let log = events;
        api.expect_change_status().returning(move |page, _| {
            log.lock().unwrap().push(format!("status:{}", page.id));
            true
        });
        api
    }
}

fn read_manifest(report_path: &std::path::Path) -> Vec<Value> {
    let bytes = std::fs::read(report_path).expect("manifest should exist");
    serde_json::from_slice(&bytes).expect("manifest should be a JSON array")
}

fn titles(manifest: &[Value]) -> Vec<&str> {
    manifest
        .iter()
        .map(|r| r["title"].as_str().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_content_and_nested_database_are_materialized() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let events = Events::default();
    let api = Workspace::new()
        .database(
            "root",
            vec![
                content_page("a", "Alpha Post"),
                folder_page("b", "Beta Section"),
            ],
        )
        .database("db-x", vec![content_page("c", "Gamma Post")])
        .blocks("a", vec![paragraph("a-1", "Hello world")])
        .blocks("b", vec![child_database("db-x")])
        .blocks("c", vec![paragraph("c-1", "Nested body")])
        .into_api(events.clone());

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .expect("synchronise should succeed");

    let manifest = read_manifest(&report.manifest_path);
    assert_eq!(report.manifest_path, home.path().join("content/blogs.json"));
    assert_eq!(titles(&manifest), vec!["Alpha Post", "Gamma Post"]);
    assert_eq!(manifest[0]["accessPath"], "alpha-post");
    assert_eq!(manifest[1]["accessPath"], "gamma-post");
    assert_eq!(manifest[0]["author"], "Alice");

    let alpha = std::fs::read_to_string(home.path().join("content/alpha-post.md"))
        .expect("content page file should exist");
    assert!(alpha.starts_with("---\n"), "file should open with a YAML header: {alpha}");
    assert!(alpha.contains("title: Alpha Post"));
    assert!(alpha.contains("Hello world"));

    let gamma = home.path().join("content/beta-section/gamma-post.md");
    assert!(gamma.is_file(), "nested page should land below its owner folder");
    assert!(
        !home.path().join("content/beta-section.md").exists(),
        "container pages are not rendered"
    );

    assert_eq!(report.databases.len(), 2);
    assert_eq!(report.databases[0].containers, 1);
    assert!(report.failed_databases.is_empty());
}

#[tokio::test]
async fn test_child_databases_are_queried_after_parent_is_done() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let events = Events::default();
    let api = Workspace::new()
        .database(
            "root",
            vec![
                content_page("p1", "Holder One"),
                content_page("p2", "Holder Two"),
                content_page("r", "Root Post"),
            ],
        )
        .database(
            "d1",
            vec![
                content_page("d1a", "D1 Post"),
                content_page("d1b", "D1 Holder"),
            ],
        )
        .database("d2", vec![content_page("d2a", "D2 Post")])
        .database("e", vec![content_page("ea", "E Post")])
        .blocks("p1", vec![child_database("d1")])
        .blocks("p2", vec![child_database("d2")])
        .blocks("d1b", vec![child_database("e")])
        .into_api(events.clone());

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap();

    let manifest = read_manifest(&report.manifest_path);
    assert_eq!(
        titles(&manifest),
        vec!["Root Post", "D1 Post", "D2 Post", "E Post"],
        "databases should be drained breadth-first"
    );

    let events = events.lock().unwrap();
    let position = |needle: &str| {
        events
            .iter()
            .position(|e| e == needle)
            .unwrap_or_else(|| panic!("missing event {needle}: {events:?}"))
    };
    assert!(
        position("status:r") < position("query:d1"),
        "parent statuses must change before nested databases are queried"
    );
    assert!(position("query:d2") < position("query:e"));
    assert!(home.path().join("content/holder-one/d1-post.md").is_file());
    assert!(home
        .path()
        .join("content/holder-one/d1-holder/e-post.md")
        .is_file());
}

#[tokio::test]
async fn test_block_fetch_failure_skips_only_that_page() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let events = Events::default();

    let mut api = MockContentApi::new();
    api.expect_query_database().returning(|_, _| {
        Ok(vec![
            content_page("a", "First"),
            content_page("b", "Broken"),
            content_page("c", "Third"),
        ])
    });
    api.expect_query_block_children().returning(|id| match id {
        "b" => Err("upstream timeout".into()),
        _ => Ok(vec![paragraph("x", "body")]),
    });
    api.expect_query_user().returning(|id| Ok(user(id, "Alice")));
    let log = events.clone();
    api.expect_change_status().returning(move |page, _| {
        log.lock().unwrap().push(page.id.clone());
        true
    });

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .expect("a failing page must not abort the run");

    let manifest = read_manifest(&report.manifest_path);
    assert_eq!(titles(&manifest), vec!["First", "Third"]);

    let skipped = &report.databases[0].skipped_pages;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].page_id, "b");
    assert_eq!(skipped[0].index, 1);
    assert!(skipped[0].reason.contains("upstream timeout"));

    assert_eq!(*events.lock().unwrap(), vec!["a", "c"]);
    assert_eq!(report.published, 2);
}

#[tokio::test]
async fn test_unwritable_page_is_skipped_and_traversal_continues() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let api = Workspace::new()
        .database(
            "root",
            vec![
                Page::new("untitled").with_authors("u-alice", "u-alice"),
                content_page("ok", "Fine Post"),
            ],
        )
        .into_api(Events::default());

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title, "Fine Post");
    let skipped = &report.databases[0].skipped_pages[0];
    assert_eq!(skipped.page_id, "untitled");
    assert!(skipped.reason.contains("empty path"), "{}", skipped.reason);
    let manifest = read_manifest(&report.manifest_path);
    assert_eq!(titles(&manifest), vec!["Fine Post"]);
    assert_eq!(manifest[0]["accessPath"], "fine-post");
}

#[tokio::test]
async fn test_users_are_looked_up_once_per_database() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");

    let mut api = MockContentApi::new();
    api.expect_query_database().returning(|_, _| {
        Ok((0..5)
            .map(|i| {
                let (created, edited) = if i % 2 == 0 { ("u1", "u2") } else { ("u2", "u1") };
                content_page(&format!("p{i}"), &format!("Post {i}")).with_authors(created, edited)
            })
            .collect())
    });
    api.expect_query_block_children().returning(|_| Ok(vec![]));
    api.expect_query_user()
        .times(2)
        .returning(|id| Ok(user(id, if id == "u1" { "One" } else { "Two" })));
    api.expect_change_status().returning(|_, _| false);

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 5);
    assert_eq!(report.records[0].author.as_deref(), Some("One"));
    assert_eq!(report.records[1].author.as_deref(), Some("Two"));
    assert_eq!(report.databases[0].user_lookups, 2);
    assert_eq!(report.published, 0);
}

#[tokio::test]
async fn test_failed_user_lookup_is_not_retried() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");

    let mut api = MockContentApi::new();
    api.expect_query_database().returning(|_, _| {
        Ok(vec![
            content_page("a", "One"),
            content_page("b", "Two"),
            content_page("c", "Three"),
        ])
    });
    api.expect_query_block_children().returning(|_| Ok(vec![]));
    api.expect_query_user()
        .times(1)
        .returning(|_| Err("forbidden".into()));
    api.expect_change_status().returning(|_, _| true);

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 3);
    assert!(report.records.iter().all(|r| r.author.is_none()));
    assert_eq!(report.databases[0].user_lookup_failures, 1);
}

#[tokio::test]
async fn test_each_child_database_is_queried_once() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");

    let mut api = MockContentApi::new();
    api.expect_query_database()
        .withf(|_, id| id == "root")
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                content_page("p", "Hub"),
                content_page("q", "Other Hub"),
            ])
        });
    api.expect_query_database()
        .withf(|_, id| id == "x")
        .times(1)
        .returning(|_, _| Ok(vec![content_page("x1", "From X")]));
    api.expect_query_database()
        .withf(|_, id| id == "y")
        .times(1)
        .returning(|_, _| Ok(vec![]));
    api.expect_query_block_children().returning(|id| {
        Ok(match id {
            // The same database is referenced twice on one page and again on another.
            "p" => vec![
                child_database("x"),
                paragraph("wrap", "wrapper").with_children(vec![child_database("x")]),
                child_database("y"),
            ],
            "q" => vec![child_database("x")],
            _ => vec![],
        })
    });
    api.expect_query_user().returning(|id| Ok(user(id, "Alice")));
    api.expect_change_status().returning(|_, _| true);

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title, "From X");
    assert_eq!(
        report
            .databases
            .iter()
            .map(|d| d.database_id.as_str())
            .collect::<Vec<_>>(),
        vec!["root", "x", "y"]
    );
}

#[tokio::test]
async fn test_failing_child_database_is_not_fatal() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let api = Workspace::new()
        .database(
            "root",
            vec![content_page("a", "Kept"), content_page("h", "Holder")],
        )
        .blocks("h", vec![child_database("missing")])
        .into_api(Events::default());

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .expect("deferred failures are recorded, not raised");

    assert_eq!(titles(&read_manifest(&report.manifest_path)), vec!["Kept"]);
    assert_eq!(report.failed_databases.len(), 1);
    assert_eq!(report.failed_databases[0].database_id, "missing");
    assert!(report.failed_databases[0].reason.contains("not found"));
}

#[tokio::test]
async fn test_root_query_failure_is_fatal() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");

    let mut api = MockContentApi::new();
    api.expect_query_database()
        .times(1)
        .returning(|_, _| Err("unauthorized".into()));

    let err = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .expect_err("root query failure should abort");

    assert!(
        matches!(&err, SiteError::RootQuery { database_id, .. } if database_id == "root"),
        "unexpected error: {err:?}"
    );
    assert!(!config.manifest_path().exists());
}

#[tokio::test]
async fn test_unusable_home_path_fails_before_any_query() {
    let home = tempdir().unwrap();
    let file = home.path().join("not-a-dir");
    std::fs::write(&file, "x").unwrap();
    let config = SiteConfig::with_defaults(&file, "root");

    // No expectations: any remote call panics.
    let api = MockContentApi::new();

    let err = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SiteError::ContentDir { .. }), "{err:?}");
}

#[tokio::test]
async fn test_settings_and_folders_produce_no_records() {
    let home = tempdir().unwrap();
    let config = SiteConfig::with_defaults(home.path(), "root");
    let api = Workspace::new()
        .database(
            "root",
            vec![
                settings_page("s", "Site Settings"),
                folder_page("f", "Guides"),
            ],
        )
        .into_api(Events::default());

    let report = synchronise(&config, &api, &MarkdownRenderer::new())
        .await
        .unwrap();

    assert!(read_manifest(&report.manifest_path).is_empty());
    assert_eq!(report.settings.len(), 1);
    assert_eq!(report.settings[0].title, "Site Settings");
    assert_eq!(report.databases[0].folders, 1);
    assert!(home.path().join("content/guides").is_dir());
    assert!(!home.path().join("content/site-settings.md").exists());
}
