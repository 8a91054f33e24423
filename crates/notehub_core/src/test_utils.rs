//! Test utilities for notehub_core
//!
//! Shared fixtures: a store backed by the in-memory backend, plus the
//! backend handle itself so tests can seed files, play an external writer
//! and inspect commits.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::{Config, Credentials};
use crate::daily::FixedClock;
use crate::store::RemoteStore;
use crate::transport::InMemoryBackend;

/// Credentials for the fixture repository.
pub fn test_credentials() -> Credentials {
    Config::new("test-token", "octo", "notes")
        .credentials()
        .unwrap()
}

/// An empty repository and a store pointed at it.
pub fn memory_store() -> (RemoteStore<InMemoryBackend>, InMemoryBackend) {
    store_with(&[])
}

/// A repository seeded with `files` and a store pointed at it.
pub fn store_with(files: &[(&str, &str)]) -> (RemoteStore<InMemoryBackend>, InMemoryBackend) {
    let backend = InMemoryBackend::new().with_token("test-token");
    for (path, content) in files {
        backend.put_file(path, content);
    }
    (RemoteStore::new(test_credentials(), backend.clone()), backend)
}

/// A clock frozen at `date` `hh:mm`.
pub fn clock_at(date: &str, hour: u32, minute: u32) -> FixedClock {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
    FixedClock::new(NaiveDateTime::new(date, time))
}
