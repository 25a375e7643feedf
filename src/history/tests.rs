use super::*;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> HistoryStore {
    HistoryStore::new(dir.path().join("history.json"))
}

#[test]
fn load_missing_file_returns_empty_transcript() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);

    let messages = store.load().expect("load should succeed");

    assert!(messages.is_empty());
}

#[test]
fn save_and_load_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    let messages = vec![
        Message::user("What is ohm's law?"),
        Message::assistant("V = IR."),
    ];

    store.save(&messages).expect("save should succeed");
    let loaded = store.load().expect("load should succeed");

    assert_eq!(loaded, messages);
}

#[test]
fn save_replaces_prior_contents() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);

    store.save(&[Message::user("first")]).expect("save");
    store.save(&[Message::user("second")]).expect("save");

    let loaded = store.load().expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].content, "second");
}

#[test]
fn clear_removes_the_file() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.save(&[Message::user("hello")]).expect("save");

    store.clear().expect("clear should succeed");

    assert!(!store.path().exists());
    assert!(store.load().expect("load").is_empty());
}

#[test]
fn clear_without_file_is_a_no_op() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);

    store.clear().expect("clear should succeed");
}

#[test]
fn corrupt_file_is_a_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    std::fs::write(store.path(), "{ not json").expect("write");

    let err = store.load().expect_err("load should fail");

    assert!(matches!(err, HistoryError::Parse(_)));
}

#[test]
fn roles_serialize_lowercase() {
    let json = serde_json::to_value(Message::new(Role::System, "x")).expect("serialize");

    assert_eq!(json["role"], "system");
}

#[test]
fn loads_file_without_saved_at() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        r#"{"messages":[{"role":"user","content":"hi"}]}"#,
    )
    .expect("write");

    let loaded = store.load().expect("load should succeed");

    assert_eq!(loaded, vec![Message::user("hi")]);
}
