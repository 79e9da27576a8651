// Tests for the JSON snippet store

use super::*;
use tempfile::{tempdir, TempDir};

fn store() -> (TempDir, SnippetStore) {
    let dir = tempdir().unwrap();
    let store = SnippetStore::new(dir.path().join("snippets.json"));
    (dir, store)
}

fn grouped(keyword: &str, replacement: &str, group: &str) -> SnippetEntry {
    let mut entry = SnippetEntry::new(keyword.to_string(), replacement.to_string());
    entry.group = Some(group.to_string());
    entry
}

#[test]
fn test_load_missing_database() {
    let (_dir, store) = store();
    assert!(matches!(
        store.load(),
        Err(TexpandError::DatabaseNotFound(_))
    ));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_empty_file_is_empty_database() {
    let (_dir, store) = store();
    fs::write(store.path(), "").unwrap();
    assert_eq!(store.load().unwrap(), SnippetDatabase::default());
}

#[test]
fn test_add_update_delete() {
    let (_dir, store) = store();
    store
        .add(SnippetEntry::new("sig".to_string(), "Best".to_string()))
        .unwrap();
    store.update("sig", "Regards".to_string()).unwrap();

    let snippets = store.list().unwrap();
    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets[0].replacement, "Regards");

    store.delete("sig").unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_duplicate_keyword_rejected() {
    let (_dir, store) = store();
    store
        .add(SnippetEntry::new("sig".to_string(), "a".to_string()))
        .unwrap();
    assert!(store
        .add(SnippetEntry::new("sig".to_string(), "b".to_string()))
        .is_err());
}

#[test]
fn test_missing_keyword_errors() {
    let (_dir, store) = store();
    store.save(&SnippetDatabase::default()).unwrap();

    assert!(matches!(
        store.update("nope", "x".to_string()),
        Err(TexpandError::SnippetNotFound(_))
    ));
    assert!(matches!(
        store.delete("nope"),
        Err(TexpandError::SnippetNotFound(_))
    ));
}

#[test]
fn test_disabled_group_hidden_from_triggers() {
    let (_dir, store) = store();
    store.add(grouped("addr", "1 Main St", "personal")).unwrap();
    store.add(grouped("ticket", "JIRA-", "work")).unwrap();
    store
        .add(SnippetEntry::new("today".to_string(), "{date}".to_string()))
        .unwrap();

    store.set_group_enabled("work", false).unwrap();

    let keywords: Vec<String> = store
        .list_active_triggers()
        .unwrap()
        .into_iter()
        .map(|t| t.spec.keyword)
        .collect();
    assert_eq!(keywords, vec!["addr".to_string(), "today".to_string()]);
}

#[test]
fn test_record_usage_increments() {
    let (_dir, store) = store();
    let entry = SnippetEntry::new("sig".to_string(), "x".to_string());
    let id = entry.id.clone();
    store.add(entry).unwrap();

    store.record_usage(&id);
    store.record_usage(&id);

    assert_eq!(store.list().unwrap()[0].usage_count, 2);
    assert_eq!(store.load_with_usage().unwrap().snippets[0].usage_count, 2);
    assert_eq!(store.usage_counts().unwrap().get(&id), Some(&2));
}

#[test]
fn test_record_usage_leaves_database_untouched() {
    let (_dir, store) = store();
    let entry = SnippetEntry::new("sig".to_string(), "x".to_string());
    let id = entry.id.clone();
    store.add(entry).unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    store.record_usage(&id);

    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    assert!(store.usage_path().ends_with("snippets.usage.json"));
}

#[test]
fn test_record_usage_unknown_id_is_silent() {
    let (_dir, store) = store();
    store.record_usage("missing");
    store.save(&SnippetDatabase::default()).unwrap();
    store.record_usage("missing");
}

#[test]
fn test_import_merges() {
    let (dir, store) = store();
    store
        .add(SnippetEntry::new("sig".to_string(), "old".to_string()))
        .unwrap();
    store.set_group_enabled("work", false).unwrap();

    let other = SnippetStore::new(dir.path().join("other.json"));
    other
        .save(&SnippetDatabase {
            groups: vec![
                SnippetGroup {
                    name: "work".to_string(),
                    enabled: true,
                },
                SnippetGroup {
                    name: "home".to_string(),
                    enabled: true,
                },
            ],
            snippets: vec![
                SnippetEntry::new("sig".to_string(), "new".to_string()),
                SnippetEntry::new("addr".to_string(), "1 Main St".to_string()),
            ],
        })
        .unwrap();

    let (added, updated) = store.import(other.path()).unwrap();
    assert_eq!((added, updated), (1, 1));

    let db = store.load().unwrap();
    assert_eq!(find_snippet(&db.snippets, "sig").unwrap().replacement, "new");
    assert!(find_snippet(&db.snippets, "addr").is_some());
    assert!(!db.is_group_enabled(Some("work")));
    assert!(db.is_group_enabled(Some("home")));
}
