use rustf_query::database::{DatabaseConnectionConfig, QueryConfig};
use rustf_query::Error;
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_single_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "query.toml",
        r#"
        [database]
        url = "postgres://app@localhost/shop"
        max_connections = 20

        [query]
        preserve_queries = true
        "#,
    );

    let config = QueryConfig::from_file(&path).unwrap();
    let database = config.database().unwrap();
    assert_eq!(database.url, "postgres://app@localhost/shop");
    assert_eq!(database.max_connections, 20);
    assert_eq!(database.min_connections, 1);
    assert_eq!(database.connect_timeout, 30);
    assert!(config.query.use_transaction);
    assert!(config.query.preserve_queries);
}

#[test]
fn test_override_file_is_merged() {
    let dir = TempDir::new().unwrap();
    let base = write(
        &dir,
        "query.toml",
        r#"
        [database]
        url = "mysql://localhost/app"
        max_connections = 5
        idle_timeout = 120

        [query]
        quote_identifiers = true
        "#,
    );
    let overrides = write(
        &dir,
        "query.production.toml",
        r#"
        [database]
        url = "mysql://db.internal/app"

        [query]
        use_transaction = false
        "#,
    );

    let config = QueryConfig::load(&base, &overrides).unwrap();
    let database = config.database().unwrap();
    assert_eq!(database.url, "mysql://db.internal/app");
    assert_eq!(database.max_connections, 5);
    assert_eq!(database.idle_timeout, 120);
    assert!(!config.query.use_transaction);
    assert!(config.query.quote_identifiers);

    // A missing override file leaves the base untouched
    let config = QueryConfig::load(&base, dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.database().unwrap().url, "mysql://localhost/app");
}

#[test]
fn test_invalid_files() {
    let dir = TempDir::new().unwrap();
    let broken = write(&dir, "broken.toml", "[database\nurl = ");
    assert!(matches!(QueryConfig::from_file(&broken), Err(Error::Toml(_))));

    let bounds = write(
        &dir,
        "bounds.toml",
        r#"
        [database]
        url = "sqlite::memory:"
        max_connections = 2
        min_connections = 4
        "#,
    );
    assert!(matches!(QueryConfig::from_file(&bounds), Err(Error::Config(_))));

    let missing = QueryConfig::from_file(dir.path().join("nope.toml")).unwrap_err();
    assert!(missing.is_configuration());
}

#[test]
fn test_no_database_section() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "query.toml", "[query]\nuse_transaction = true\n");
    let config = QueryConfig::from_file(&path).unwrap();
    assert!(config.database.is_none());
    assert!(config.database().is_err());
    assert_eq!(
        DatabaseConnectionConfig::new("sqlite::memory:").max_lifetime,
        1800
    );
}
