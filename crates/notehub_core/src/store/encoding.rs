//! Base64 content encoding for the contents API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{NotehubError, Result};

/// Encode UTF-8 text for a write request.
pub fn encode_content(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

/// Decode a base64 payload as returned by the backend.
///
/// The backend wraps payloads with newlines; all ASCII whitespace is
/// ignored. Blobs that are not valid UTF-8 are binary and not supported.
pub fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| NotehubError::Unavailable(format!("Malformed content for '{}': {}", path, e)))?;

    String::from_utf8(bytes)
        .map_err(|_| NotehubError::Unsupported(format!("'{}' is a binary file", path)))
}
