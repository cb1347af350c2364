use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, NamedTempFile};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

fn notion_site() -> Command {
    let mut cmd = Command::cargo_bin("notion-site").expect("Binary exists");
    cmd.env_remove("NOTION_SECRET").env_remove("GITHUB_ACTIONS");
    cmd
}

#[test]
fn help_lists_subcommands() {
    notion_site()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync").and(predicate::str::contains("init")));
}

#[test]
fn init_writes_config_and_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notion-site.yaml");

    notion_site()
        .arg("init")
        .arg("--path")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("database_id"), "unexpected config: {written}");
    assert!(written.contains("filter_prop: Status"));

    notion_site()
        .arg("init")
        .arg("--path")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to overwrite"));
}

#[test]
fn sync_fails_for_missing_config_file() {
    let dir = tempdir().unwrap();
    notion_site()
        .current_dir(dir.path())
        .arg("sync")
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn sync_requires_notion_secret() {
    let dir = tempdir().unwrap();
    let config = NamedTempFile::new_in(dir.path()).unwrap();
    write(
        config.path(),
        format!("home_path: {}\ndatabase_id: abc123\n", dir.path().display()),
    )
    .unwrap();

    notion_site()
        .current_dir(dir.path())
        .arg("sync")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOTION_SECRET"));
}

/// Collects the debug rendering of every emitted event.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use notion_site::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Sync {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };
    assert!(run(cli).await.is_err(), "missing config must fail");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
