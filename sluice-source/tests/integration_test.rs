use sluice_config::{SluiceConfig, SourceConfig};
use sluice_source::prelude::*;
use sluice_source::testing::{MemoryBackend, MemoryObjectStore};
use sluice_source::{FilesystemBackend, ObjectStoreBackend};
use std::sync::Arc;
use tempfile::TempDir;

fn write_migrations(dir: &TempDir, files: &[(&str, &str)]) {
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
}

fn file_address(dir: &TempDir) -> String {
    format!("file://{}", dir.path().display())
}

async fn walk_forward(source: &dyn SourceDriver) -> Vec<Version> {
    let mut versions = Vec::new();
    let mut current = match source.first().await {
        Ok(v) => v,
        Err(e) if e.is_not_found() => return versions,
        Err(e) => panic!("first failed: {}", e),
    };

    loop {
        versions.push(current);
        match source.next(current).await {
            Ok(v) => current = v,
            Err(e) if e.is_not_found() => return versions,
            Err(e) => panic!("next failed: {}", e),
        }
    }
}

#[tokio::test]
async fn test_filesystem_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    write_migrations(
        &temp_dir,
        &[
            ("1_init.up.sql", "CREATE TABLE t (id int);"),
            ("1_init.down.sql", "DROP TABLE t;"),
            ("3_add_col.up.sql", "ALTER TABLE t ADD COLUMN c int;"),
        ],
    );

    let registry = SourceRegistry::with_defaults(&SluiceConfig::default());
    let source = registry.open(&file_address(&temp_dir)).await.unwrap();

    assert_eq!(source.first().await.unwrap(), 1);
    assert_eq!(source.next(1).await.unwrap(), 3);
    assert_eq!(source.prev(3).await.unwrap(), 1);
    assert!(source.next(3).await.unwrap_err().is_not_found());
    assert!(source.read_down(3).await.unwrap_err().is_not_found());

    let up = source.read_up(1).await.unwrap();
    assert_eq!(up.identifier, "init");
    assert_eq!(up.raw, "1_init.up.sql");
    assert_eq!(up.read_to_string().await.unwrap(), "CREATE TABLE t (id int);");

    source.close().await.unwrap();
    assert!(matches!(source.first().await, Err(SourceError::Closed)));
}

#[tokio::test]
async fn test_filesystem_permissive_and_strict() {
    let temp_dir = TempDir::new().unwrap();
    write_migrations(
        &temp_dir,
        &[
            ("1_init.up.sql", "CREATE TABLE t (id int);"),
            ("notaversion.sql", "-- scratch"),
        ],
    );

    let permissive = MigrationSource::open(FilesystemBackend::new(temp_dir.path()), SourceOptions::default())
        .await
        .unwrap();
    assert_eq!(walk_forward(&permissive).await, vec![1]);

    let strict = MigrationSource::open(
        FilesystemBackend::new(temp_dir.path()),
        SourceOptions::default().with_parse_policy(ParsePolicy::Reject),
    )
    .await;
    match strict {
        Err(SourceError::Parse { raw, .. }) => assert_eq!(raw, "notaversion.sql"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("strict open should fail"),
    }
}

#[tokio::test]
async fn test_strict_policy_from_config() {
    let temp_dir = TempDir::new().unwrap();
    write_migrations(&temp_dir, &[("1_init.up.sql", ""), ("README.md", "")]);

    let mut config = SluiceConfig::default();
    config.source = SourceConfig {
        parse_policy: Some(ParsePolicy::Reject),
        open_timeout: None,
    };

    let registry = SourceRegistry::with_defaults(&config);
    let err = registry.open(&file_address(&temp_dir)).await.err().unwrap();
    assert!(matches!(err, SourceError::Parse { .. }));
}

#[tokio::test]
async fn test_missing_directory_fails_enumeration() {
    let registry = SourceRegistry::with_defaults(&SluiceConfig::default());
    let err = registry
        .open("file:///this/directory/does/not/exist")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::Enumeration { .. }));
}

#[tokio::test]
async fn test_walk_backwards_over_gaps() {
    let backend = MemoryBackend::with_entries([
        ("20240101000000_a.up.sql", ""),
        ("20240102000000_b.up.sql", ""),
        ("20240102000000_b.down.sql", ""),
        ("20240301000000_c.down.sql", ""),
    ]);
    let source = MigrationSource::open(backend, SourceOptions::default()).await.unwrap();

    let last = source.migrations().last().unwrap();
    let mut versions = vec![last];
    let mut current = last;
    while let Ok(prev) = source.prev(current).await {
        versions.push(prev);
        current = prev;
    }

    assert_eq!(versions, vec![20240301000000, 20240102000000, 20240101000000]);
}

#[tokio::test]
async fn test_object_store_with_injected_client() {
    let store = Arc::new(MemoryObjectStore::new());
    store.put("releases", "app/1_init.up.sql", "CREATE TABLE t (id int);").await;
    store.put("releases", "app/1_init.down.sql", "DROP TABLE t;").await;
    store.put("releases", "app/2_index.up.sql", "CREATE INDEX i ON t (id);").await;
    store.put("releases", "app/notes.txt", "release notes").await;
    store.put("releases", "app/old/0_legacy.up.sql", "").await;

    let address = sluice_source::SourceAddress::parse("s3://releases/app/").unwrap();
    let backend = ObjectStoreBackend::from_address(store.clone(), &address).unwrap();
    let source = MigrationSource::open(backend, SourceOptions::default()).await.unwrap();

    assert_eq!(walk_forward(&source).await, vec![1, 2]);

    // the caller keeps its client and can still use it
    assert!(store.delete("releases", "app/2_index.up.sql").await);
    let err = source.read_up(2).await.unwrap_err();
    assert!(matches!(err, SourceError::Fetch { .. }));
    assert_eq!(
        source.read_up(1).await.unwrap().read_to_string().await.unwrap(),
        "CREATE TABLE t (id int);"
    );
}

#[tokio::test]
async fn test_object_store_listing_failure() {
    let store = Arc::new(MemoryObjectStore::new());
    store.fail_listing(true);

    let backend = ObjectStoreBackend::new(store, "releases", "");
    let err = MigrationSource::open(backend, SourceOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::Enumeration { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads() {
    let entries: Vec<(String, String)> = (1..=50)
        .flat_map(|v| {
            vec![
                (format!("{}_m{}.up.sql", v, v), format!("up {}", v)),
                (format!("{}_m{}.down.sql", v, v), format!("down {}", v)),
            ]
        })
        .collect();

    let backend = Arc::new(MemoryBackend::with_entries(entries));
    let source: Arc<dyn SourceDriver> = Arc::new(
        MigrationSource::open(backend.clone(), SourceOptions::default())
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for version in 1..=50u64 {
        for _ in 0..2 {
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                let up = source.read_up(version).await?.read_to_string().await.unwrap();
                let down = source.read_down(version).await?.read_to_string().await.unwrap();
                Ok::<_, SourceError>((version, up, down))
            }));
        }
    }

    for handle in handles {
        let (version, up, down) = handle.await.unwrap().unwrap();
        assert_eq!(up, format!("up {}", version));
        assert_eq!(down, format!("down {}", version));
    }

    // every read is an independent fetch
    assert_eq!(backend.fetch_count(), 200);
}
