//! In-memory emulation of the repository contents API.
//!
//! [`InMemoryBackend`] answers the same requests as the real backend, with
//! the same status codes and JSON shapes, against a map of path → content.
//! Directories are implicit, as in git: a folder exists while some file
//! lives beneath it. Version tokens are content-addressed (files) and
//! derived from children (folders), so an unchanged subtree keeps its token.
//!
//! Used by the test suites and for trying the store without a network.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use url::Url;

use super::{BoxFuture, HttpRequest, HttpResponse, Method, Transport};
use crate::error::{NotehubError, Result};
use crate::types::VersionToken;

/// A commit recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub path: String,
    pub message: String,
}

#[derive(Default)]
struct State {
    files: BTreeMap<String, String>,
    commits: Vec<CommitRecord>,
    injected: VecDeque<(Method, u16)>,
}

/// A mock contents API for testing.
///
/// Uses `Arc<Mutex<..>>` so clones share the same repository, which lets a
/// test play an "external writer" next to the store under test.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
    requests: Arc<AtomicUsize>,
    token: Option<String>,
}

impl InMemoryBackend {
    /// Create an empty repository accepting any access token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept `token`; anything else gets a 401 (builder pattern).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Seed a file (builder pattern).
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.put_file(path, content);
        self
    }

    /// Write a file directly, bypassing preconditions (an external writer).
    pub fn put_file(&self, path: &str, content: &str) -> VersionToken {
        let mut state = self.lock();
        state.files.insert(path.to_string(), content.to_string());
        blob_token(content)
    }

    /// Delete a file directly, bypassing preconditions.
    pub fn remove_file(&self, path: &str) -> bool {
        self.lock().files.remove(path).is_some()
    }

    /// Get the content of a file (for test assertions).
    pub fn get_content(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).cloned()
    }

    /// Current version token of a file.
    pub fn file_token(&self, path: &str) -> Option<VersionToken> {
        self.lock().files.get(path).map(|c| blob_token(c))
    }

    /// All stored file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Commits accepted so far, oldest first.
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.lock().commits.clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Answer the next request with `method` with a bare `status`.
    pub fn inject_status(&self, method: Method, status: u16) {
        self.lock().injected.push_back((method, status));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not wedge the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(expected) = &self.token {
            let presented = request.header_value("Authorization").unwrap_or_default();
            if presented != format!("token {}", expected) {
                return Ok(error_response(401, "Bad credentials"));
            }
        }

        {
            let mut state = self.lock();
            if let Some(idx) = state
                .injected
                .iter()
                .position(|(method, _)| *method == request.method)
            {
                let (_, status) = state.injected.remove(idx).unwrap_or((request.method, 500));
                return Ok(error_response(status, "Injected failure"));
            }
        }

        let url = Url::parse(&request.url)
            .map_err(|e| NotehubError::Unavailable(format!("Bad URL '{}': {}", request.url, e)))?;
        let segments: Vec<String> = url
            .path_segments()
            .map(|s| {
                s.map(|seg| {
                    urlencoding::decode(seg)
                        .map(|d| d.into_owned())
                        .unwrap_or_else(|_| seg.to_string())
                })
                .collect()
            })
            .unwrap_or_default();

        if let Some(pos) = segments.iter().position(|s| s == "search")
            && segments.get(pos + 1).map(String::as_str) == Some("code")
        {
            let query = url
                .query_pairs()
                .find(|(k, _)| k == "q")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            return Ok(self.search(&query));
        }

        let Some(pos) = segments.iter().position(|s| s == "contents") else {
            return Ok(error_response(404, "Not Found"));
        };
        let path = segments[pos + 1..]
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("/");

        let body = request.body.unwrap_or(Value::Null);
        Ok(match request.method {
            Method::Get => self.get(&path),
            Method::Put => self.put(&path, &body),
            Method::Delete => self.delete(&path, &body),
        })
    }

    fn get(&self, path: &str) -> HttpResponse {
        let state = self.lock();

        if let Some(content) = state.files.get(path) {
            return HttpResponse::new(200, file_object(path, content, true));
        }

        let entries = list_dir(&state.files, path);
        if entries.is_empty() && !path.is_empty() {
            return error_response(404, "Not Found");
        }
        HttpResponse::new(200, Value::Array(entries))
    }

    fn put(&self, path: &str, body: &Value) -> HttpResponse {
        let message = body.get("message").and_then(Value::as_str).unwrap_or("");
        if message.trim().is_empty() || path.is_empty() {
            return error_response(422, "Invalid request.\n\n\"message\" wasn't supplied.");
        }
        let Some(encoded) = body.get("content").and_then(Value::as_str) else {
            return error_response(422, "Invalid request.\n\n\"content\" wasn't supplied.");
        };
        let Some(content) = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        else {
            return error_response(422, "content is not valid Base64");
        };
        let sha = body.get("sha").and_then(Value::as_str);

        let mut state = self.lock();
        if !list_dir(&state.files, path).is_empty() {
            return error_response(422, "path is a directory");
        }

        let status = match (state.files.get(path), sha) {
            (Some(existing), None) => {
                if *existing == content {
                    // Identical create is a no-op
                    return HttpResponse::new(200, write_result(path, existing, message));
                }
                return error_response(422, "Invalid request.\n\n\"sha\" wasn't supplied.");
            }
            (Some(existing), Some(sha)) => {
                if blob_token(existing).as_str() != sha {
                    return error_response(409, &format!("{} does not match {}", path, sha));
                }
                200
            }
            (None, Some(sha)) => {
                return error_response(409, &format!("{} does not match {}", path, sha));
            }
            (None, None) => 201,
        };

        state.files.insert(path.to_string(), content.clone());
        state.commits.push(CommitRecord {
            path: path.to_string(),
            message: message.to_string(),
        });
        HttpResponse::new(status, write_result(path, &content, message))
    }

    fn delete(&self, path: &str, body: &Value) -> HttpResponse {
        let message = body.get("message").and_then(Value::as_str).unwrap_or("");
        let mut state = self.lock();

        let Some(existing) = state.files.get(path) else {
            return error_response(404, "Not Found");
        };
        let Some(sha) = body.get("sha").and_then(Value::as_str) else {
            return error_response(422, "Invalid request.\n\n\"sha\" wasn't supplied.");
        };
        if message.trim().is_empty() {
            return error_response(422, "Invalid request.\n\n\"message\" wasn't supplied.");
        }
        if blob_token(existing).as_str() != sha {
            return error_response(409, &format!("{} does not match {}", path, sha));
        }

        state.files.remove(path);
        state.commits.push(CommitRecord {
            path: path.to_string(),
            message: message.to_string(),
        });
        HttpResponse::new(
            200,
            json!({ "content": null, "commit": { "sha": commit_id(path, message), "message": message } }),
        )
    }

    fn search(&self, query: &str) -> HttpResponse {
        let terms: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.contains(':'))
            .map(str::to_lowercase)
            .collect();
        let md_only = query.split_whitespace().any(|t| t == "extension:md");

        let state = self.lock();
        let items: Vec<Value> = state
            .files
            .iter()
            .filter(|(path, _)| !md_only || path.ends_with(".md"))
            .filter(|(path, content)| {
                let haystack = format!("{}\n{}", path, content).to_lowercase();
                !terms.is_empty() && terms.iter().all(|t| haystack.contains(t.as_str()))
            })
            .map(|(path, content)| {
                json!({
                    "name": file_name(path),
                    "path": path,
                    "sha": blob_token(content).as_str(),
                })
            })
            .collect();

        HttpResponse::new(
            200,
            json!({ "total_count": items.len(), "incomplete_results": false, "items": items }),
        )
    }
}

impl Transport for InMemoryBackend {
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse>> {
        Box::pin(async move { self.handle(request) })
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("files", &self.lock().files.len())
            .field("requests", &self.request_count())
            .finish()
    }
}

fn error_response(status: u16, message: &str) -> HttpResponse {
    HttpResponse::new(status, json!({ "message": message }))
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn blob_token(content: &str) -> VersionToken {
    let mut hasher = DefaultHasher::new();
    "blob".hash(&mut hasher);
    content.len().hash(&mut hasher);
    content.hash(&mut hasher);
    VersionToken::new(format!("{:016x}", hasher.finish()))
}

fn commit_id(path: &str, message: &str) -> String {
    let mut hasher = DefaultHasher::new();
    "commit".hash(&mut hasher);
    path.hash(&mut hasher);
    message.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Token of a folder: derived from every file beneath it.
fn tree_token(files: &BTreeMap<String, String>, dir: &str) -> VersionToken {
    let prefix = format!("{}/", dir);
    let mut hasher = DefaultHasher::new();
    "tree".hash(&mut hasher);
    for (path, content) in files.range(prefix.clone()..) {
        if !path.starts_with(&prefix) {
            break;
        }
        path.hash(&mut hasher);
        content.hash(&mut hasher);
    }
    VersionToken::new(format!("{:016x}", hasher.finish()))
}

/// GitHub wraps base64 payloads every 60 characters.
fn wrapped_base64(content: &str) -> String {
    let encoded = STANDARD.encode(content.as_bytes());
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 60 + 1);
    for (i, ch) in encoded.chars().enumerate() {
        if i > 0 && i % 60 == 0 {
            out.push('\n');
        }
        out.push(ch);
    }
    out.push('\n');
    out
}

fn file_object(path: &str, content: &str, with_content: bool) -> Value {
    let mut object = json!({
        "type": "file",
        "name": file_name(path),
        "path": path,
        "sha": blob_token(content).as_str(),
        "size": content.len(),
    });
    if with_content {
        object["encoding"] = json!("base64");
        object["content"] = json!(wrapped_base64(content));
    }
    object
}

fn write_result(path: &str, content: &str, message: &str) -> Value {
    json!({
        "content": file_object(path, content, false),
        "commit": { "sha": commit_id(path, message), "message": message },
    })
}

/// Immediate children of `dir`, sorted by name.
fn list_dir(files: &BTreeMap<String, String>, dir: &str) -> Vec<Value> {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    };

    let mut entries: BTreeMap<String, Value> = BTreeMap::new();
    for (path, content) in files.range(prefix.clone()..) {
        let Some(rest) = path.strip_prefix(&prefix) else {
            break;
        };
        match rest.split_once('/') {
            Some((folder, _)) => {
                if !entries.contains_key(folder) {
                    let folder_path = format!("{}{}", prefix, folder);
                    let token = tree_token(files, &folder_path);
                    entries.insert(
                        folder.to_string(),
                        json!({
                            "type": "dir",
                            "name": folder,
                            "path": folder_path,
                            "sha": token.as_str(),
                            "size": 0,
                        }),
                    );
                }
            }
            None => {
                entries.insert(rest.to_string(), file_object(path, content, false));
            }
        }
    }
    entries.into_values().collect()
}
