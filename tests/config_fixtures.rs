//! Config fixtures drive how expressions are emitted and replayed

use std::path::Path;

use explorer_app::config::{load_settings, StorageBackend};
use sdk_explorer::commands::{self, parse_assignment};
use sdk_explorer::HeadlessEvent;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/config")
        .join(name)
}

#[test]
fn test_custom_output_fixture_parses() {
    let settings = load_settings(&fixture("custom_output.toml"));

    assert_eq!(settings.output.global_accessor, "app");
    assert_eq!(settings.output.argument_separator, ",");
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    assert_eq!(settings.ui.menu_width, 32);
}

#[tokio::test]
async fn test_custom_accessor_round_trips() {
    let settings = load_settings(&fixture("custom_output.toml"));
    let mut explorer = commands::build_explorer(settings, false, None).unwrap();
    commands::call(&mut explorer, "group.createGroup", &[])
        .await
        .unwrap();

    let events = commands::emit(
        &explorer,
        "group.joinGroup",
        &[parse_assignment("nickname=erin").unwrap()],
        false,
    )
    .unwrap();
    let text = match &events[0] {
        HeadlessEvent::Expression { text, .. } => text.clone(),
        other => panic!("expected expression, got {:?}", other),
    };
    assert_eq!(text, r#"group.joinGroup(app.group,"erin")"#);

    // window.* is not a reference under this accessor
    let events = commands::replay(&mut explorer, r#"group.joinGroup(window.group,"erin")"#).await;
    assert!(events[0].is_failure());

    let events = commands::replay(&mut explorer, &text).await;
    match events.last() {
        Some(HeadlessEvent::CallSucceeded { result, .. }) => {
            assert_eq!(result["members"], serde_json::json!(["erin"]));
        }
        other => panic!("expected call_succeeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreplayable_output_falls_back_and_round_trips() {
    let settings = load_settings(&fixture("unreplayable_output.toml"));
    assert_eq!(settings.output.global_accessor, "window");
    assert_eq!(settings.output.argument_separator, ", ");
    assert_eq!(settings.storage.backend, StorageBackend::Memory);

    let mut explorer = commands::build_explorer(settings, false, None).unwrap();
    commands::call(&mut explorer, "group.createGroup", &[])
        .await
        .unwrap();
    let events = commands::emit(
        &explorer,
        "group.joinGroup",
        &[parse_assignment("nickname=erin").unwrap()],
        false,
    )
    .unwrap();
    let text = match &events[0] {
        HeadlessEvent::Expression { text, .. } => text.clone(),
        other => panic!("expected expression, got {:?}", other),
    };
    assert_eq!(text, r#"group.joinGroup(window.group, "erin")"#);

    let events = commands::replay(&mut explorer, &text).await;
    assert!(matches!(events.last(), Some(HeadlessEvent::CallSucceeded { .. })));
}

#[test]
fn test_init_then_load_matches_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let event = commands::init(&path).unwrap();
    assert!(matches!(event, HeadlessEvent::ConfigInitialized { created: true, .. }));
    assert_eq!(load_settings(&path), explorer_app::config::Settings::default());
}
