use serde::Serialize;
use thiserror::Error;

/// Unified error type for notehub operations
#[derive(Debug, Error)]
pub enum NotehubError {
    // Configuration errors
    #[error("Missing configuration: {0}. Run 'notehub init' or set the matching environment variable")]
    MissingConfiguration(&'static str),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    // Backend errors
    #[error("Unauthorized: the access token was rejected by the backend")]
    Unauthorized,

    #[error("Not found: '{0}'")]
    NotFound(String),

    #[error("Already exists: '{0}'")]
    AlreadyExists(String),

    #[error("Conflict: '{0}' was changed remotely (stale version token)")]
    Conflict(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    // Recursive operations
    #[error("Deletion of '{path}' stopped after removing {removed} file(s): {source}")]
    PartialDeletion {
        path: String,
        removed: usize,
        #[source]
        source: Box<NotehubError>,
    },

    // Document lifecycle
    #[error("Unsaved changes in '{path}': {source}")]
    UnsavedChanges {
        path: String,
        #[source]
        source: Box<NotehubError>,
    },

    #[error("No document is open")]
    NoDocument,

    #[error("Nothing to append: text is empty")]
    EmptyAppend,

    // Date errors
    #[error("Invalid date format: '{0}'. Try 'today', 'yesterday', '3 days ago', or 'YYYY-MM-DD'")]
    InvalidDateFormat(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for notehub operations
pub type Result<T> = std::result::Result<T, NotehubError>;

/// Coarse classification a UI can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingConfiguration,
    Unauthorized,
    NotFound,
    AlreadyExists,
    Conflict,
    Unavailable,
    Unsupported,
    /// Local errors that are neither backend nor configuration failures
    Local,
}

impl NotehubError {
    /// Classify this error.
    ///
    /// Wrapper variants (`PartialDeletion`, `UnsavedChanges`) report the kind
    /// of the failure they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotehubError::MissingConfiguration(_) | NotehubError::NoConfigDir => {
                ErrorKind::MissingConfiguration
            }
            NotehubError::Unauthorized => ErrorKind::Unauthorized,
            NotehubError::NotFound(_) => ErrorKind::NotFound,
            NotehubError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            NotehubError::Conflict(_) => ErrorKind::Conflict,
            NotehubError::Unavailable(_) => ErrorKind::Unavailable,
            NotehubError::Unsupported(_) => ErrorKind::Unsupported,
            NotehubError::PartialDeletion { source, .. }
            | NotehubError::UnsavedChanges { source, .. } => source.kind(),
            NotehubError::ConfigParse(_)
            | NotehubError::ConfigSerialize(_)
            | NotehubError::NoDocument
            | NotehubError::EmptyAppend
            | NotehubError::InvalidDateFormat(_)
            | NotehubError::Io(_) => ErrorKind::Local,
        }
    }

    /// True for stale-token failures that need a reload.
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// True for transient failures a caller may retry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }

    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// A serializable representation of NotehubError for UI collaborators
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Coarse error kind
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Associated remote path (if applicable)
    pub path: Option<String>,
}

impl From<&NotehubError> for SerializableError {
    fn from(err: &NotehubError) -> Self {
        let path = match err {
            NotehubError::NotFound(path)
            | NotehubError::AlreadyExists(path)
            | NotehubError::Conflict(path) => Some(path.clone()),
            NotehubError::PartialDeletion { path, .. }
            | NotehubError::UnsavedChanges { path, .. } => Some(path.clone()),
            _ => None,
        };

        Self {
            kind: err.kind(),
            message: err.to_string(),
            path,
        }
    }
}

impl From<NotehubError> for SerializableError {
    fn from(err: NotehubError) -> Self {
        SerializableError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_distinguishes_user_visible_failures() {
        assert_eq!(
            NotehubError::Conflict("a.md".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            NotehubError::Unavailable("timeout".into()).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            NotehubError::MissingConfiguration("token").kind(),
            ErrorKind::MissingConfiguration
        );
    }

    #[test]
    fn test_wrapped_errors_report_inner_kind() {
        let err = NotehubError::PartialDeletion {
            path: "Projects".into(),
            removed: 2,
            source: Box::new(NotehubError::Conflict("Projects/b.md".into())),
        };
        assert!(err.is_conflict());
        assert!(!err.is_retryable());

        let err = NotehubError::UnsavedChanges {
            path: "Notes/a.md".into(),
            source: Box::new(NotehubError::Unavailable("503".into())),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_serializable_error_carries_path() {
        let err = NotehubError::NotFound("Daily/2024-01-01.md".into());
        let ser = err.to_serializable();
        assert_eq!(ser.kind, ErrorKind::NotFound);
        assert_eq!(ser.path.as_deref(), Some("Daily/2024-01-01.md"));
        assert!(ser.message.contains("Daily/2024-01-01.md"));
    }
}
