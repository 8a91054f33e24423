//! Observable autosave state.

use serde::Serialize;
use ts_rs::TS;

use crate::types::VersionToken;

/// Where an open document stands relative to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    /// No document is open
    Idle,
    /// Local content matches what was last saved or loaded
    Clean,
    /// Local edits are waiting for the debounce deadline
    Dirty,
    /// A save is in flight
    Saving,
    /// The remote changed underneath the local edits
    Conflict,
}

impl SaveState {
    /// Human-readable label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            SaveState::Idle => "idle",
            SaveState::Clean => "saved",
            SaveState::Dirty => "unsaved",
            SaveState::Saving => "saving",
            SaveState::Conflict => "conflict",
        }
    }
}

/// Editable projection of one remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Document {
    pub path: String,
    pub content: String,
    /// Token the next save is conditioned on; `None` for a new file
    pub version_token: Option<VersionToken>,
    /// Content differs from what was last saved or loaded
    pub dirty: bool,
}
