use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

use gallery_ingest::cli::{exit_code, run, Cli};
use gallery_ingest_core::GalleryError;

/// Collects the debug rendering of every emitted event.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

/// Settings pointing the token endpoint at a closed port.
fn unreachable_authority_config() -> TempDir {
    let dir = tempdir().expect("temp dir");
    write(
        dir.path().join("appsettings.yaml"),
        r#"
gallery:
  login: Frank
  password: password
  api_identifier: imagegalleryapi
  base_uri: http://127.0.0.1:1
token_endpoint:
  authority: http://127.0.0.1:1
  client_id: imagegalleryclient
local:
  directory: ./does-not-matter
"#,
    )
    .expect("write config");
    dir
}

#[test]
fn missing_config_file_exits_with_failure() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("gallery-ingest").expect("Binary exists");
    cmd.arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .env_remove("GALLERY_PASSWORD")
        .env_remove("FLICKR_API_KEY");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("[ERROR]")
                .and(predicate::str::contains("Failed to read config file")),
        );
}

#[test]
fn token_failure_exits_with_status_two() {
    let dir = unreachable_authority_config();
    let mut cmd = Command::cargo_bin("gallery-ingest").expect("Binary exists");
    cmd.current_dir(dir.path())
        .arg("--skip-search")
        .env("GALLERY_ENVIRONMENT", "Test");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Ingest failed"));
}

#[test]
fn search_without_api_key_is_a_configuration_error() {
    let dir = unreachable_authority_config();
    let mut cmd = Command::cargo_bin("gallery-ingest").expect("Binary exists");
    cmd.current_dir(dir.path()).env_remove("FLICKR_API_KEY");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("api_key"));
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let cli = Cli {
        config: std::path::PathBuf::from("dummy.yaml"),
        environment: "Development".into(),
        skip_search: true,
        skip_local: true,
    };

    let err = run(cli).await.unwrap_err();
    assert_eq!(exit_code(&err), 1);

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[test]
fn authentication_anywhere_in_the_chain_maps_to_two() {
    let err = anyhow::Error::new(GalleryError::Authentication("invalid_grant".into()))
        .context("requesting token");
    assert_eq!(exit_code(&err), 2);

    let err = anyhow::Error::new(GalleryError::Api {
        status: 503,
        body: String::new(),
    });
    assert_eq!(exit_code(&err), 1);
}
