use super::*;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().expect("tempdir");

    let config = Config::load_from(dir.path()).expect("load should succeed");

    assert_eq!(config.openrouter, OpenRouterConfig::default());
    assert_eq!(config.retrieval.chunk_size, 500);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.base_dir, dir.path());
}

#[test]
fn save_and_load_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config::load_from(dir.path()).expect("load");
    config.openrouter.chat_model = "anthropic/claude-3.5-sonnet".to_string();
    config.retrieval.top_k = 5;

    config.save().expect("save should succeed");
    let loaded = Config::load_from(dir.path()).expect("reload should succeed");

    assert_eq!(loaded.openrouter.chat_model, "anthropic/claude-3.5-sonnet");
    assert_eq!(loaded.retrieval.top_k, 5);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("config.toml"),
        "[openrouter]\nchat_model = \"some/model\"\n",
    )
    .expect("write");

    let config = Config::load_from(dir.path()).expect("load should succeed");

    assert_eq!(config.openrouter.chat_model, "some/model");
    assert_eq!(config.openrouter.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.retrieval.chunk_size, 500);
}

#[test]
fn invalid_file_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("config.toml"),
        "[openrouter]\nbatch_size = 0\n",
    )
    .expect("write");

    assert!(Config::load_from(dir.path()).is_err());
}

#[test]
fn validate_rejects_bad_url() {
    let mut config = Config::load_from("unused").expect("defaults");
    config.openrouter.base_url = "not a url".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));
}

#[test]
fn validate_rejects_non_http_scheme() {
    let mut config = Config::load_from("unused").expect("defaults");
    config.openrouter.base_url = "ftp://example.com/api".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn validate_rejects_empty_model() {
    let mut config = Config::load_from("unused").expect("defaults");
    config.openrouter.embedding_model = "  ".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn validate_rejects_out_of_range_retrieval_settings() {
    let mut config = Config::load_from("unused").expect("defaults");
    config.retrieval.chunk_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));

    let mut config = Config::load_from("unused").expect("defaults");
    config.retrieval.top_k = 51;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTopK(51))));
}

#[test]
fn history_path_is_inside_base_dir() {
    let dir = TempDir::new().expect("tempdir");
    let config = Config::load_from(dir.path()).expect("load");

    assert_eq!(config.history_path(), dir.path().join("history.json"));
}

#[test]
fn api_key_never_serialized() {
    let config = Config::load_from("unused").expect("defaults");

    let toml = toml::to_string_pretty(&config).expect("serialize");

    // Only the variable name is stored, never a key value.
    assert!(toml.contains("api_key_env"));
    assert!(!toml.to_lowercase().contains("sk-"));
}
