//! Dirty-tracking autosave.
//!
//! An [`AutosaveController`] owns at most one open [`Document`] and moves it
//! through [`SaveState`]:
//!
//! ```text
//! Idle --open--> Clean --edit--> Dirty --deadline/flush--> Saving --> Clean
//!                                  ^                         |
//!                                  +------- edit ------- Conflict
//! ```
//!
//! Edits are debounced: each edit re-arms a single deadline, and the save
//! runs once the document has been quiet for the debounce period. Before
//! every write the controller re-reads the remote version token; if it
//! moved, the save stops in `Conflict` without writing and the local edits
//! are kept until [`AutosaveController::resolve`] is called.
//!
//! The controller does not own a timer. Either call
//! [`AutosaveController::tick`] from an existing event loop, or hand the
//! controller to [`spawn_autosave`].

mod conflict;
mod driver;
mod events;
mod state;

pub use conflict::ConflictResolution;
pub use driver::spawn_autosave;
pub use events::{AutosaveCallback, AutosaveEvent, CallbackRegistry, SubscriptionId};
pub use state::{Document, SaveState};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{NotehubError, Result};
use crate::store::{RemoteStore, commit};
use crate::transport::Transport;
use crate::types::{VersionToken, normalize_path};

/// Default quiescence before an edited document is saved.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1_500);

struct OpenDocument {
    /// Guards against applying results to a document opened later
    id: u64,
    document: Document,
    /// Bumped on every edit
    revision: u64,
    /// Content of a save that was dropped before its response arrived
    interrupted: Option<String>,
}

struct Inner {
    open: Option<OpenDocument>,
    state: SaveState,
    deadline: Option<Instant>,
}

/// Debounced, conflict-aware autosave for one document at a time.
pub struct AutosaveController<T: Transport> {
    store: RemoteStore<T>,
    debounce: Duration,
    inner: Mutex<Inner>,
    /// Held for the whole of a save attempt
    save_lock: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
    events: CallbackRegistry,
    pub(crate) wake: Notify,
}

impl<T: Transport> AutosaveController<T> {
    pub fn new(store: RemoteStore<T>) -> Self {
        Self::with_debounce(store, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(store: RemoteStore<T>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            inner: Mutex::new(Inner {
                open: None,
                state: SaveState::Idle,
                deadline: None,
            }),
            save_lock: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(1),
            events: CallbackRegistry::new(),
            wake: Notify::new(),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn state(&self) -> SaveState {
        self.lock().state
    }

    /// Snapshot of the open document.
    pub fn document(&self) -> Option<Document> {
        self.lock().open.as_ref().map(|open| open.document.clone())
    }

    /// When the pending save is due, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().deadline
    }

    pub fn subscribe(&self, callback: AutosaveCallback) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Open `path` for editing.
    ///
    /// Any document already open goes through [`close`](Self::close) first;
    /// if that fails, nothing changes and the error is returned. A path
    /// that does not exist opens as a new, empty document.
    pub async fn open(&self, path: &str) -> Result<Document> {
        self.close().await?;

        let path = normalize_path(path);
        let (content, version_token) = match self.store.read(&path).await {
            Ok(file) => (file.content, Some(file.version_token)),
            Err(NotehubError::NotFound(_)) => (String::new(), None),
            Err(e) => return Err(e),
        };

        let document = Document {
            path: path.clone(),
            content,
            version_token,
            dirty: false,
        };
        {
            let mut inner = self.lock();
            inner.open = Some(OpenDocument {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                document: document.clone(),
                revision: 0,
                interrupted: None,
            });
            inner.state = SaveState::Clean;
            inner.deadline = None;
        }

        log::debug!("Opened '{}'", path);
        self.emit_state(Some(path), SaveState::Clean);
        Ok(document)
    }

    /// Replace the document's content and (re)arm the save deadline.
    pub fn edit(&self, content: impl Into<String>) -> Result<()> {
        let (path, changed_to) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let previous = inner.state;
            let open = inner.open.as_mut().ok_or(NotehubError::NoDocument)?;

            open.document.content = content.into();
            open.document.dirty = true;
            open.revision += 1;
            let path = open.document.path.clone();

            // A save in flight re-checks the revision when it lands
            if previous != SaveState::Saving {
                inner.state = SaveState::Dirty;
            }
            inner.deadline = Some(Instant::now() + self.debounce);
            (path, (previous != inner.state).then_some(inner.state))
        };

        self.wake.notify_one();
        if let Some(state) = changed_to {
            self.emit_state(Some(path), state);
        }
        Ok(())
    }

    /// Save if the document is dirty and its deadline has passed.
    ///
    /// Returns whether a save was attempted.
    pub async fn tick(&self) -> Result<bool> {
        let due = {
            let inner = self.lock();
            inner.state == SaveState::Dirty
                && inner.deadline.is_some_and(|deadline| deadline <= Instant::now())
        };
        if !due {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    /// Save now if the document is dirty, regardless of the deadline.
    pub async fn flush(&self) -> Result<()> {
        self.save().await
    }

    /// Release the open document, saving it first if dirty.
    ///
    /// If that save fails the document stays open and
    /// [`NotehubError::UnsavedChanges`] is returned.
    pub async fn close(&self) -> Result<()> {
        let path = match self.lock().open.as_ref() {
            Some(open) => open.document.path.clone(),
            None => return Ok(()),
        };

        if let Err(e) = self.save().await {
            return Err(NotehubError::UnsavedChanges {
                path,
                source: Box::new(e),
            });
        }

        self.release();
        log::debug!("Closed '{}'", path);
        Ok(())
    }

    /// Release the open document without saving.
    pub fn discard(&self) {
        if self.release() {
            log::debug!("Discarded unsaved edits");
        }
    }

    /// Resolve a conflict.
    ///
    /// - `KeepLocal` adopts the current remote token and marks the document
    ///   dirty, so the next save overwrites the remote version.
    /// - `KeepRemote` reloads the remote content, dropping local edits.
    /// - `Skip` leaves the document in conflict.
    ///
    /// Does nothing unless the document is in conflict.
    pub async fn resolve(&self, resolution: ConflictResolution) -> Result<()> {
        let (id, path) = {
            let inner = self.lock();
            match inner.open.as_ref() {
                Some(open) if inner.state == SaveState::Conflict => {
                    (open.id, open.document.path.clone())
                }
                _ => return Ok(()),
            }
        };
        if resolution == ConflictResolution::Skip {
            return Ok(());
        }

        let remote = match self.store.read(&path).await {
            Ok(file) => Some(file),
            Err(NotehubError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let state = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let Some(open) = inner.open.as_mut().filter(|open| open.id == id) else {
                return Ok(());
            };
            open.revision += 1;
            match resolution {
                ConflictResolution::KeepLocal => {
                    open.document.version_token = remote.map(|file| file.version_token);
                    open.document.dirty = true;
                    inner.state = SaveState::Dirty;
                    inner.deadline = Some(Instant::now() + self.debounce);
                }
                _ => {
                    let (content, token) = remote
                        .map(|file| (file.content, Some(file.version_token)))
                        .unwrap_or_default();
                    open.document.content = content;
                    open.document.version_token = token;
                    open.document.dirty = false;
                    inner.state = SaveState::Clean;
                    inner.deadline = None;
                }
            }
            inner.state
        };

        log::info!("Resolved conflict on '{}' ({:?})", path, resolution);
        self.wake.notify_one();
        self.emit_state(Some(path), state);
        Ok(())
    }

    /// One serialized save attempt.
    async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;

        let (id, path, content, token, revision, interrupted) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let state = inner.state;
            let Some(open) = inner.open.as_ref() else {
                return Ok(());
            };
            if state == SaveState::Conflict {
                return Err(NotehubError::Conflict(open.document.path.clone()));
            }
            if !open.document.dirty {
                return Ok(());
            }
            let snapshot = (
                open.id,
                open.document.path.clone(),
                open.document.content.clone(),
                open.document.version_token.clone(),
                open.revision,
                open.interrupted.clone(),
            );
            inner.state = SaveState::Saving;
            inner.deadline = None;
            snapshot
        };
        self.emit_state(Some(path.clone()), SaveState::Saving);

        let in_flight = SaveInFlight {
            controller: self,
            id,
            path: path.clone(),
            content: Some(content.clone()),
        };
        let result = self
            .write_checked(&path, &content, token.as_ref(), interrupted.as_deref())
            .await;
        in_flight.finish();

        let (outcome, events) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let Some(open) = inner.open.as_mut().filter(|open| open.id == id) else {
                // The document was released while saving; drop the result
                return result.map(|_| ());
            };

            let mut events = Vec::new();
            let outcome = match result {
                Ok(new_token) => {
                    open.document.version_token = Some(new_token.clone());
                    open.interrupted = None;
                    events.push(AutosaveEvent::Saved {
                        path: path.clone(),
                        version_token: new_token,
                    });
                    if open.revision == revision {
                        open.document.dirty = false;
                        inner.state = SaveState::Clean;
                    } else {
                        inner.state = SaveState::Dirty;
                        inner
                            .deadline
                            .get_or_insert_with(|| Instant::now() + self.debounce);
                    }
                    Ok(())
                }
                Err(e) if e.is_conflict() => {
                    inner.state = SaveState::Conflict;
                    events.push(AutosaveEvent::Conflict { path: path.clone() });
                    Err(e)
                }
                Err(e) => {
                    inner.state = SaveState::Dirty;
                    inner.deadline = Some(Instant::now() + self.debounce);
                    events.push(AutosaveEvent::SaveFailed {
                        path: path.clone(),
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    });
                    Err(e)
                }
            };
            events.push(AutosaveEvent::StateChanged {
                path: Some(path.clone()),
                state: inner.state,
            });
            (outcome, events)
        };

        match &outcome {
            Ok(()) => log::info!("Saved '{}'", path),
            Err(e) if e.is_conflict() => log::warn!("'{}' changed remotely; keeping local edits", path),
            Err(e) => log::warn!("Saving '{}' failed: {}", path, e),
        }
        self.wake.notify_one();
        for event in &events {
            self.events.emit(event);
        }
        outcome
    }

    /// Re-validate the remote token, then write conditioned on it.
    ///
    /// A moved token is a conflict, unless the remote content is exactly
    /// what an interrupted save of this document was writing: that commit
    /// landed, so its token is adopted.
    async fn write_checked(
        &self,
        path: &str,
        content: &str,
        token: Option<&VersionToken>,
        interrupted: Option<&str>,
    ) -> Result<VersionToken> {
        let remote = match self.store.read(path).await {
            Ok(file) => Some(file),
            Err(NotehubError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        if remote.as_ref().map(|file| &file.version_token) != token {
            return match remote {
                Some(file) if interrupted == Some(file.content.as_str()) => {
                    log::debug!("Interrupted save of '{}' had landed", path);
                    if file.content == content {
                        return Ok(file.version_token);
                    }
                    self.store
                        .write(path, content, &commit::update(path), Some(&file.version_token))
                        .await
                }
                _ => Err(NotehubError::Conflict(path.to_string())),
            };
        }

        let message = commit::for_write(path, token.is_some());
        self.store.write(path, content, &message, token).await
    }

    /// Returns whether a document was open.
    fn release(&self) -> bool {
        let released = {
            let mut inner = self.lock();
            inner.deadline = None;
            inner.state = SaveState::Idle;
            inner.open.take().is_some()
        };
        if released {
            self.emit_state(None, SaveState::Idle);
        }
        released
    }

    fn emit_state(&self, path: Option<String>, state: SaveState) {
        self.events
            .emit(&AutosaveEvent::StateChanged { path, state });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Puts the document back to `Dirty` if a save is dropped mid-flight.
///
/// The write may or may not have reached the backend; the content is kept
/// so the next save can recognise its own commit.
struct SaveInFlight<'a, T: Transport> {
    controller: &'a AutosaveController<T>,
    id: u64,
    path: String,
    /// `Some` until the save completes
    content: Option<String>,
}

impl<T: Transport> SaveInFlight<'_, T> {
    fn finish(mut self) {
        self.content = None;
    }
}

impl<T: Transport> Drop for SaveInFlight<'_, T> {
    fn drop(&mut self) {
        let Some(content) = self.content.take() else {
            return;
        };

        let restored = {
            let mut guard = self.controller.lock();
            let inner = &mut *guard;
            match inner.open.as_mut() {
                Some(open) if open.id == self.id && inner.state == SaveState::Saving => {
                    open.interrupted = Some(content);
                    inner.state = SaveState::Dirty;
                    inner.deadline = Some(Instant::now() + self.controller.debounce);
                    true
                }
                _ => false,
            }
        };

        if restored {
            log::warn!("Save of '{}' was cancelled before it completed", self.path);
            self.controller.wake.notify_one();
            self.controller
                .emit_state(Some(self.path.clone()), SaveState::Dirty);
        }
    }
}

impl<T: Transport> std::fmt::Debug for AutosaveController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("AutosaveController")
            .field("path", &inner.open.as_ref().map(|o| &o.document.path))
            .field("state", &inner.state)
            .field("debounce", &self.debounce)
            .finish()
    }
}
