//! Daily note aggregator.
//!
//! One Markdown file per calendar day at `<daily_folder>/<YYYY-MM-DD>.md`.
//! A day without a file is represented by a synthetic, empty note
//! (`is_new`) that becomes real on its first write. Daily notes are never
//! deleted here.

mod clock;
pub mod date;
mod sanitize;

pub use clock::{Clock, FixedClock, SystemClock};
pub use date::{parse_date, parse_date_at};
pub use sanitize::sanitize_daily_content;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures_util::future::join_all;
use serde::Serialize;
use ts_rs::TS;

use crate::error::{NotehubError, Result};
use crate::store::{RemoteStore, commit};
use crate::transport::Transport;
use crate::types::{VersionToken, join_path, normalize_path};

/// The note for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DailyNote {
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub path: String,
    /// Raw stored content (empty for new notes)
    pub content: String,
    pub version_token: Option<VersionToken>,
    /// No remote file backs this note yet
    pub is_new: bool,
}

impl DailyNote {
    /// Content with front-matter and dated headers stripped.
    pub fn body(&self) -> String {
        sanitize_daily_content(&self.content, self.date)
    }
}

/// Reads and writes daily notes through a [`RemoteStore`].
pub struct DailyNotes<T: Transport> {
    store: RemoteStore<T>,
    clock: Arc<dyn Clock>,
    folder: String,
}

impl<T: Transport> DailyNotes<T> {
    /// Daily notes under `folder`, dated by the system clock.
    pub fn new(store: RemoteStore<T>, folder: &str) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            folder: normalize_path(folder),
        }
    }

    /// Replace the clock (builder pattern).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Path of the note for `date`.
    pub fn path_for(&self, date: NaiveDate) -> String {
        join_path(&self.folder, &format!("{}.md", date::date_stem(date)))
    }

    /// The note for `date`, or a new empty one if none is stored.
    pub async fn get_or_create(&self, date: NaiveDate) -> Result<DailyNote> {
        let path = self.path_for(date);
        match self.store.read(&path).await {
            Ok(file) => Ok(DailyNote {
                date,
                path,
                content: file.content,
                version_token: Some(file.version_token),
                is_new: false,
            }),
            Err(NotehubError::NotFound(_)) => Ok(DailyNote {
                date,
                path,
                content: String::new(),
                version_token: None,
                is_new: true,
            }),
            Err(e) => Err(e),
        }
    }

    /// Today's note.
    pub async fn today(&self) -> Result<DailyNote> {
        self.get_or_create(self.clock.today()).await
    }

    /// The last `days` notes ending today, newest first.
    ///
    /// All reads run concurrently; the first failure is returned.
    pub async fn list_recent(&self, days: usize) -> Result<Vec<DailyNote>> {
        let today = self.clock.today();
        let dates: Vec<NaiveDate> = (0..days)
            .filter_map(|offset| {
                let offset = i64::try_from(offset).ok()?;
                today.checked_sub_signed(Duration::days(offset))
            })
            .collect();

        join_all(dates.into_iter().map(|date| self.get_or_create(date)))
            .await
            .into_iter()
            .collect()
    }

    /// Append a timestamped entry to today's note.
    ///
    /// The existing content is sanitized first, so repeated appends never
    /// duplicate headers. Entries are separated by a blank line and start
    /// with a bold `HH:MM` stamp. The write is conditional on the token
    /// read just before (`Conflict` if someone else wrote in between).
    pub async fn append(&self, text: &str) -> Result<DailyNote> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NotehubError::EmptyAppend);
        }

        let now = self.clock.now();
        let note = self.get_or_create(now.date()).await?;

        let entry = format!("**{}** {}", now.format("%H:%M"), text);
        let existing = note.body();
        let content = if existing.is_empty() {
            entry
        } else {
            format!("{}\n\n{}", existing, entry)
        };

        let token = self
            .store
            .write(
                &note.path,
                &content,
                &commit::append_daily_note(note.date),
                note.version_token.as_ref(),
            )
            .await?;

        log::info!("Appended to daily note {}", note.date);
        Ok(DailyNote {
            content,
            version_token: Some(token),
            is_new: false,
            ..note
        })
    }

    /// Save edited content for `note`.
    ///
    /// The content is sanitized, then the note's current token is re-read;
    /// if someone else changed (or deleted) the note since it was loaded
    /// the save is refused with `Conflict` and nothing is written.
    pub async fn save(&self, note: &DailyNote, content: &str) -> Result<DailyNote> {
        let content = sanitize_daily_content(content, note.date);

        let current = match self.store.read(&note.path).await {
            Ok(file) => Some(file.version_token),
            Err(NotehubError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        if current != note.version_token {
            log::warn!("Daily note {} changed remotely, not saving", note.date);
            return Err(NotehubError::Conflict(note.path.clone()));
        }

        let token = self
            .store
            .write(
                &note.path,
                &content,
                &commit::update_daily_note(note.date),
                current.as_ref(),
            )
            .await?;

        Ok(DailyNote {
            date: note.date,
            path: note.path.clone(),
            content,
            version_token: Some(token),
            is_new: false,
        })
    }
}
