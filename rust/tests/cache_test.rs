use std::path::PathBuf;

use thesis_fetch_engine::engine::cache::{JsonFileCache, MemoryCache, RecordCache};
use thesis_fetch_engine::model::RecordId;

fn rid(id: &str) -> RecordId {
    RecordId::parse(id).unwrap()
}

#[test]
fn test_memory_cache_presence_and_values() {
    let mut cache = MemoryCache::new();
    assert!(cache.is_empty());

    cache.set(rid("1"), Some(PathBuf::from("out/1-a.pdf"))).unwrap();
    cache.set(rid("2"), None).unwrap();

    assert!(cache.contains(&rid("1")));
    assert!(cache.contains(&rid("2")));
    assert!(!cache.contains(&rid("3")));
    assert_eq!(cache.get(&rid("1")), Some(Some(PathBuf::from("out/1-a.pdf"))));
    // Present with a null value is still "processed".
    assert_eq!(cache.get(&rid("2")), Some(None));
    assert_eq!(cache.get(&rid("3")), None);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_json_cache_starts_empty_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = JsonFileCache::open(dir.path().join("nope.json")).unwrap();
    assert!(cache.is_empty());
    assert!(!dir.path().join("nope.json").exists());
}

#[test]
fn test_json_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.json");

    {
        let mut cache = JsonFileCache::open(&path).unwrap();
        cache.set(rid("0042"), Some(PathBuf::from("out/0042-tese.pdf"))).unwrap();
        cache.set(rid("7"), None).unwrap();
    }

    let cache = JsonFileCache::open(&path).unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(
        cache.get(&rid("0042")),
        Some(Some(PathBuf::from("out/0042-tese.pdf")))
    );
    assert_eq!(cache.get(&rid("7")), Some(None));
    assert!(!cache.contains(&rid("42")));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["7"], serde_json::Value::Null);
    assert_eq!(raw["0042"], "out/0042-tese.pdf");
}

#[test]
fn test_json_cache_overwrites_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = JsonFileCache::open(&path).unwrap();
    cache.set(rid("5"), None).unwrap();
    cache.set(rid("5"), Some(PathBuf::from("out/5-b.pdf"))).unwrap();

    let cache = JsonFileCache::open(&path).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&rid("5")), Some(Some(PathBuf::from("out/5-b.pdf"))));
}

#[test]
fn test_json_cache_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(JsonFileCache::open(&path).is_err());
}
