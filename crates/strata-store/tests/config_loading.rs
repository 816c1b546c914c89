//! Functional tests for store configuration loaded from disk.

use anyhow::Result;
use std::io::Write;
use strata_store::{
    AttrError, AttributeStore, ConfigError, Level, SequenceMerge, StoreConfig,
    DEFAULT_CACHE_CAPACITY,
};
use strata_value::attr_path;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

/// Tenet: a TOML file selects levels, cache size and sequence handling.
#[test]
fn store_built_from_toml_file() -> Result<()> {
    let file = config_file(
        r#"
levels = ["default", "role_default", "normal", "override"]
cache_capacity = 64
slot_sequences = "union"
"#,
    )?;
    let config = StoreConfig::from_toml_file(file.path())?;
    assert_eq!(config.cache_capacity, 64);
    assert_eq!(config.slot_sequences, SequenceMerge::Union);

    let mut store = AttributeStore::with_config(config)?;
    assert_eq!(
        store.configured_levels().collect::<Vec<_>>(),
        vec![Level::Default, Level::RoleDefault, Level::Normal, Level::Override]
    );

    store.set(Level::Default, &attr_path!["pkgs"], vec!["curl"])?;
    store.set(Level::RoleDefault, &attr_path!["pkgs"], vec!["git"])?;
    assert_eq!(store.read("pkgs").map(|v| v.len()), Some(2));

    assert!(matches!(
        store.set(Level::Automatic, &attr_path!["platform"], "linux"),
        Err(AttrError::UnknownLevel(_))
    ));
    Ok(())
}

/// Tenet: omitted settings take their defaults.
#[test]
fn empty_file_means_defaults() -> Result<()> {
    let file = config_file("")?;
    let config = StoreConfig::from_toml_file(file.path())?;
    assert_eq!(config, StoreConfig::default());
    assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    assert_eq!(config.levels, Level::ALL.to_vec());
    Ok(())
}

/// Tenet: unreadable or invalid configuration is reported, not defaulted.
#[test]
fn bad_configuration_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        StoreConfig::from_toml_file(&missing),
        Err(ConfigError::Io { ref path, .. }) if *path == missing
    ));

    let unknown = config_file(r#"levels = ["default", "sometimes"]"#)?;
    assert!(matches!(
        StoreConfig::from_toml_file(unknown.path()),
        Err(ConfigError::Parse(_))
    ));

    let duplicate = config_file(r#"levels = ["normal", "normal"]"#)?;
    assert!(matches!(
        StoreConfig::from_toml_file(duplicate.path()),
        Err(ConfigError::DuplicateLevel(Level::Normal))
    ));

    let empty = config_file("levels = []")?;
    assert!(matches!(
        StoreConfig::from_toml_file(empty.path()),
        Err(ConfigError::NoLevels)
    ));

    assert!(matches!(
        AttributeStore::with_config(StoreConfig::new().with_levels([])),
        Err(ConfigError::NoLevels)
    ));
    Ok(())
}
