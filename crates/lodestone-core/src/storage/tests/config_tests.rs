use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

use crate::storage::config::{ConfigStore, Template};
use crate::storage::error::Result;
use crate::storage::local::LocalStorageProvider;
use crate::storage::provider::StorageProvider;

const TEMPLATE: &str = "debug: false\n#enable logs\nport: 8080";

fn create_test_provider() -> (Arc<dyn StorageProvider>, tempfile::TempDir) {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = Arc::new(LocalStorageProvider::new(temp_dir.path().to_path_buf()))
        as Arc<dyn StorageProvider>;
    (provider, temp_dir)
}

fn config_path() -> PathBuf {
    PathBuf::from("config").join("test_plugin").join("settings.yml")
}

#[test]
fn test_open_creates_file_from_template() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let store = ConfigStore::open(provider.clone(), config_path(), template, false)?;

    // Fresh directory: values are exactly the template defaults
    assert_eq!(store.get::<bool>("debug"), Some(false));
    assert_eq!(store.get::<i64>("port"), Some(8080));
    assert_eq!(store.keys(), vec!["debug", "port"]);

    // The backing file exists and holds the template verbatim
    let on_disk = std::fs::read_to_string(
        temp_dir.path().join("config").join("test_plugin").join("settings.yml"),
    )
    .expect("Config file should exist");
    assert_eq!(on_disk, TEMPLATE);

    Ok(())
}

#[test]
fn test_set_round_trips_through_disk() -> Result<()> {
    let (provider, _temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider.clone(), config_path(), template.clone(), false)?;
    store.set("port", 9090)?;
    assert_eq!(store.get::<i64>("port"), Some(9090));

    // Reopening from disk yields the same value
    let reopened = ConfigStore::open(provider, config_path(), template, false)?;
    assert_eq!(reopened.get::<i64>("port"), Some(9090));
    assert_eq!(reopened.get::<bool>("debug"), Some(false));

    Ok(())
}

#[test]
fn test_set_preserves_comments() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider, config_path(), template, false)?;
    store.set("debug", true)?;

    let on_disk = std::fs::read_to_string(
        temp_dir.path().join("config").join("test_plugin").join("settings.yml"),
    )
    .expect("Config file should exist");
    assert!(on_disk.contains("debug: true"));
    assert!(on_disk.contains("#enable logs"));

    Ok(())
}

#[test]
fn test_corrupted_file_is_regenerated() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    // Plant unparsable content where the config file should be
    let abs_path = temp_dir.path().join("config").join("test_plugin").join("settings.yml");
    std::fs::create_dir_all(abs_path.parent().unwrap()).expect("Failed to create config dir");
    std::fs::write(&abs_path, "{{{ this is not a config\n\tnested garbage")
        .expect("Failed to write corrupted file");

    // Opening repairs instead of raising
    let store = ConfigStore::open(provider.clone(), config_path(), template.clone(), true)?;
    assert_eq!(store.get::<bool>("debug"), Some(false));
    assert_eq!(store.get::<i64>("port"), Some(8080));

    // Repair is idempotent: the file now matches the template defaults
    let store = ConfigStore::open(provider, config_path(), template, true)?;
    assert_eq!(store.keys(), vec!["debug", "port"]);

    Ok(())
}

#[test]
fn test_reconciliation_appends_new_template_key() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();

    // First release of the plugin: no timeout key yet
    let template_v1 = Template::parse(TEMPLATE)?;
    let mut store = ConfigStore::open(provider.clone(), config_path(), template_v1, false)?;
    store.set("port", 9090)?;
    drop(store);

    // Next release adds a key; reopening the old file appends it
    let template_v2 = Template::parse("debug: false\n#enable logs\nport: 8080\ntimeout: 30")?;
    let store = ConfigStore::open(provider, config_path(), template_v2, false)?;

    assert_eq!(store.get::<i64>("timeout"), Some(30));
    // The previously set, non-default value survives reconciliation
    assert_eq!(store.get::<i64>("port"), Some(9090));

    let on_disk = std::fs::read_to_string(
        temp_dir.path().join("config").join("test_plugin").join("settings.yml"),
    )
    .expect("Config file should exist");
    assert!(on_disk.contains("timeout: 30"));

    Ok(())
}

#[test]
fn test_reconciliation_keeps_extra_keys() -> Result<()> {
    let (provider, _temp_dir) = create_test_provider();

    // A live file holding a key the template does not know about
    let template = Template::parse(TEMPLATE)?;
    let mut store = ConfigStore::open(provider.clone(), config_path(), template.clone(), false)?;
    store.add("custom", "kept", Some("user-added"))?;
    drop(store);

    let store = ConfigStore::open(provider, config_path(), template, false)?;
    assert_eq!(store.get::<String>("custom").as_deref(), Some("kept"));

    Ok(())
}

#[test]
fn test_reconciliation_copies_template_comment() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();

    let template_v1 = Template::parse("debug: false")?;
    ConfigStore::open(provider.clone(), config_path(), template_v1, false)?;

    let template_v2 = Template::parse("debug: false\nretries: 3\n#max attempts")?;
    let store = ConfigStore::open(provider, config_path(), template_v2, false)?;
    assert_eq!(store.get::<i64>("retries"), Some(3));

    let on_disk = std::fs::read_to_string(
        temp_dir.path().join("config").join("test_plugin").join("settings.yml"),
    )
    .expect("Config file should exist");
    assert!(on_disk.contains("retries: 3\n#max attempts"));

    Ok(())
}

#[test]
fn test_set_absent_key_adds_it() -> Result<()> {
    let (provider, _temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider.clone(), config_path(), template.clone(), false)?;
    store.set("brand_new", 7)?;
    assert_eq!(store.get::<i64>("brand_new"), Some(7));

    let reopened = ConfigStore::open(provider, config_path(), template, false)?;
    assert_eq!(reopened.get::<i64>("brand_new"), Some(7));

    Ok(())
}

#[test]
fn test_add_with_comment() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider, config_path(), template, false)?;
    store.add("level", "info", Some("log level"))?;
    assert_eq!(store.get::<String>("level").as_deref(), Some("info"));

    let on_disk = std::fs::read_to_string(
        temp_dir.path().join("config").join("test_plugin").join("settings.yml"),
    )
    .expect("Config file should exist");
    assert!(on_disk.contains("level: info\n#log level"));

    Ok(())
}

#[test]
fn test_set_rejects_non_scalar_values() -> Result<()> {
    let (provider, _temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider, config_path(), template, false)?;
    let result = store.set("list", vec![1, 2, 3]);
    assert!(result.is_err());
    // The failed set must not leave a phantom key behind after the next sync
    assert_eq!(store.get::<i64>("port"), Some(8080));

    Ok(())
}

#[test]
fn test_set_rejects_multiline_string_without_touching_disk() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider.clone(), config_path(), template.clone(), false)?;
    store.set("port", 9090)?;

    // A string spanning lines cannot be held by the format; it is refused
    // before the document is mutated or the file written
    let result = store.set("motd", "hello\nworld");
    assert!(result.is_err());
    assert!(!store.contains_key("motd"));

    let abs_path = temp_dir.path().join("config").join("test_plugin").join("settings.yml");
    let on_disk = std::fs::read_to_string(&abs_path).expect("Config file should exist");
    assert!(!on_disk.contains("motd"));

    // The file stayed parsable, so reopening does not regenerate and the
    // earlier non-default value survives
    let reopened = ConfigStore::open(provider, config_path(), template, false)?;
    assert_eq!(reopened.get::<i64>("port"), Some(9090));
    assert_eq!(reopened.keys(), vec!["debug", "port"]);

    Ok(())
}

#[test]
fn test_get_or_falls_back() -> Result<()> {
    let (provider, _temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let store = ConfigStore::open(provider, config_path(), template, false)?;
    assert_eq!(store.get_or("port", 0_i64), 8080);
    assert_eq!(store.get_or("missing", 42_i64), 42);
    assert!(store.get::<i64>("missing").is_none());

    Ok(())
}

#[test]
fn test_malformed_template_is_a_construction_error() {
    assert!(Template::parse("no separator here").is_err());
    assert!(Template::parse("dup: 1\ndup: 2").is_err());
}

#[test]
fn test_external_edit_survives_set() -> Result<()> {
    let (provider, temp_dir) = create_test_provider();
    let template = Template::parse(TEMPLATE)?;

    let mut store = ConfigStore::open(provider, config_path(), template, false)?;

    // Simulate an external edit between mutations
    let abs_path = temp_dir.path().join("config").join("test_plugin").join("settings.yml");
    std::fs::write(&abs_path, "debug: true\n#enable logs\nport: 8080\nextra: 1")
        .expect("Failed to write external edit");

    // set() rewrites from the in-memory document, then re-reads the
    // authoritative on-disk state
    store.set("port", 9090)?;
    assert_eq!(store.get::<i64>("port"), Some(9090));

    Ok(())
}
