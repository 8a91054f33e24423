//! Resolution of autosave conflicts.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How to resolve a document left in the `Conflict` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Keep the local edits and overwrite the remote version on the next save
    KeepLocal,

    /// Drop the local edits and reload the remote version
    KeepRemote,

    /// Do nothing; the document stays in conflict
    Skip,
}

impl FromStr for ConflictResolution {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "keep_local" | "keep-local" => Ok(ConflictResolution::KeepLocal),
            "remote" | "keep_remote" | "keep-remote" => Ok(ConflictResolution::KeepRemote),
            "skip" => Ok(ConflictResolution::Skip),
            _ => Err(()),
        }
    }
}
