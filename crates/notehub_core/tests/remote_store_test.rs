//! Integration tests for the remote store and daily notes against the
//! in-memory contents API.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures_lite::future::block_on;
use notehub_core::daily::{DailyNotes, FixedClock};
use notehub_core::error::ErrorKind;
use notehub_core::transport::InMemoryBackend;
use notehub_core::{Config, NotehubError, RemoteStore};

fn setup() -> (RemoteStore<InMemoryBackend>, InMemoryBackend) {
    let backend = InMemoryBackend::new().with_token("secret");
    let credentials = Config::new("secret", "octo", "notes").credentials().unwrap();
    (RemoteStore::new(credentials, backend.clone()), backend)
}

fn clock(date: &str, hour: u32, minute: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(NaiveDateTime::new(
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
    )))
}

#[test]
fn write_then_read_round_trips_unicode() {
    let (store, _backend) = setup();
    let long = "long line ".repeat(500);
    let samples = [
        "",
        "plain ascii",
        "# 标题\n\n中文内容，带标点。",
        "emoji 🦀🚀 and combining e\u{301}",
        "right-to-left: שלום עולם",
        long.as_str(),
    ];

    for (i, content) in samples.iter().enumerate() {
        let path = format!("Unicode/{}.md", i);
        block_on(store.write(&path, content, "Create", None)).unwrap();
        let file = block_on(store.read(&path)).unwrap();
        assert_eq!(&file.content, content);
    }
}

#[test]
fn stale_token_conflicts_and_keeps_concurrent_content() {
    let (store, backend) = setup();
    let t1 = block_on(store.write("Notes/a.md", "v1", "Create", None)).unwrap();

    // Concurrent writer wins with its own token
    let t2 = block_on(store.write("Notes/a.md", "v2 from elsewhere", "Update", Some(&t1))).unwrap();
    assert_ne!(t1, t2);

    let err = block_on(store.write("Notes/a.md", "mine", "Update", Some(&t1))).unwrap_err();
    assert!(matches!(err, NotehubError::Conflict(ref p) if p == "Notes/a.md"));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        backend.get_content("Notes/a.md").as_deref(),
        Some("v2 from elsewhere")
    );
}

#[test]
fn delete_subtree_twice_never_fails() {
    let (store, backend) = setup();
    for path in ["P/a.md", "P/b/c.md", "P/b/d/e.md", "Q/keep.md"] {
        backend.put_file(path, "x");
    }

    assert_eq!(block_on(store.delete_subtree("P")).unwrap(), 3);
    assert_eq!(block_on(store.delete_subtree("P")).unwrap(), 0);
    assert_eq!(backend.paths(), vec!["Q/keep.md"]);
}

#[test]
fn get_or_create_is_new_until_written() {
    let (store, _backend) = setup();
    let notes = DailyNotes::new(store.clone(), "Daily").with_clock(clock("2024-03-01", 8, 0));
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    assert!(block_on(notes.get_or_create(date)).unwrap().is_new);
    assert!(block_on(notes.get_or_create(date)).unwrap().is_new);

    block_on(store.write("Daily/2024-03-01.md", "first", "Create", None)).unwrap();
    let note = block_on(notes.get_or_create(date)).unwrap();
    assert!(!note.is_new);
    assert_eq!(note.content, "first");
    assert!(note.version_token.is_some());
}

#[test]
fn appends_are_ordered_without_headers() {
    let (store, backend) = setup();
    let clock = clock("2024-03-01", 9, 0);
    let notes = DailyNotes::new(store, "Daily").with_clock(clock.clone());

    block_on(notes.append("text1")).unwrap();
    clock.advance(chrono::Duration::minutes(45));
    let note = block_on(notes.append("text2")).unwrap();

    let stored = backend.get_content("Daily/2024-03-01.md").unwrap();
    assert_eq!(stored, "**09:00** text1\n\n**09:45** text2");
    assert_eq!(note.content, stored);
    assert!(stored.find("text1").unwrap() < stored.find("text2").unwrap());
    assert!(!stored.contains("---"));
    assert!(!stored.starts_with('#'));
}

#[test]
fn missing_configuration_is_reported_before_any_request() {
    let mut config = Config::new("secret", "octo", "notes");
    config.token = None;
    let err = config.credentials().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
}

#[test]
fn list_recent_reads_every_day() {
    let (store, backend) = setup();
    backend.put_file("Daily/2024-02-26.md", "monday");
    let notes = DailyNotes::new(store, "Daily").with_clock(clock("2024-03-01", 12, 0));

    let recent = block_on(notes.list_recent(7)).unwrap();
    assert_eq!(recent.len(), 7);
    assert_eq!(recent[0].path, "Daily/2024-03-01.md");
    assert_eq!(recent[6].path, "Daily/2024-02-24.md");
    assert_eq!(recent[4].content, "monday");
    assert_eq!(recent.iter().filter(|n| n.is_new).count(), 6);
}
