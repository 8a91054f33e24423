//! Remote file store client.
//!
//! [`RemoteStore`] turns path-keyed operations into contents API requests
//! and maps the backend's status codes onto [`NotehubError`]. It holds no
//! state besides its credentials and transport: every call is one request
//! (or one fan-out, for the recursive operations in `directory`) and no
//! operation retries.
//!
//! | operation | request | failure mapping |
//! |-----------|---------|-----------------|
//! | `list` / `read` | `GET contents/{path}?ref={branch}` | 404 `NotFound`, 401/403 `Unauthorized` |
//! | `write` | `PUT contents/{path}` | 409 `Conflict`, 422 `Conflict` (with token) or `AlreadyExists` |
//! | `remove` | `DELETE contents/{path}` | 404 `NotFound`, 409/422 `Conflict` |
//!
//! Any other non-success status is `Unavailable`.

pub mod commit;
mod directory;
pub mod encoding;
mod search;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::Credentials;
use crate::error::{NotehubError, Result};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::types::{Node, RemoteFile, SaveAttempt, VersionToken, normalize_path};

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("notehub/", env!("CARGO_PKG_VERSION"));

/// One entry of a directory listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

impl ContentEntry {
    fn is_dir(&self) -> bool {
        self.kind == "dir"
    }

    fn into_node(self) -> Node {
        let token = Some(VersionToken::new(self.sha));
        if self.kind == "dir" {
            Node::folder(self.path, token)
        } else {
            Node::file(self.path, token)
        }
    }
}

/// Body of a single-file `GET`.
#[derive(Debug, Deserialize)]
struct FileBody {
    path: Option<String>,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Client for the remote, version-controlled file store.
#[derive(Clone)]
pub struct RemoteStore<T: Transport> {
    transport: T,
    credentials: Credentials,
}

impl<T: Transport> RemoteStore<T> {
    /// Create a store. Credentials are already validated, so no operation
    /// can reach the network with missing configuration.
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List the immediate children of `path` (`""` is the repository root).
    ///
    /// Only folders and `.md` files are returned, in backend order. A path
    /// naming a single file yields a one-element listing of that file.
    pub async fn list(&self, path: &str) -> Result<Vec<Node>> {
        self.list_entries(path, true).await
    }

    pub(crate) async fn list_entries(&self, path: &str, notes_only: bool) -> Result<Vec<Node>> {
        let path = normalize_path(path);
        let response = self.get(&path).await?;
        if !response.is_success() {
            return Err(read_error(&path, &response));
        }

        match response.body {
            Value::Array(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for item in items {
                    let entry: ContentEntry = serde_json::from_value(item)
                        .map_err(|e| malformed(&path, e))?;
                    if notes_only && !entry.is_dir() && !entry.name.ends_with(".md") {
                        continue;
                    }
                    nodes.push(entry.into_node());
                }
                Ok(nodes)
            }
            body => {
                let entry: ContentEntry =
                    serde_json::from_value(body).map_err(|e| malformed(&path, e))?;
                Ok(vec![entry.into_node()])
            }
        }
    }

    /// Read and decode a file.
    pub async fn read(&self, path: &str) -> Result<RemoteFile> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(NotehubError::Unsupported(
                "the repository root is a directory".to_string(),
            ));
        }

        let response = self.get(&path).await?;
        if !response.is_success() {
            return Err(read_error(&path, &response));
        }
        if response.body.is_array() {
            return Err(NotehubError::Unsupported(format!("'{}' is a directory", path)));
        }

        let body: FileBody =
            serde_json::from_value(response.body).map_err(|e| malformed(&path, e))?;

        // Blobs above the API's inline limit come back without content
        let content = match (body.encoding.as_deref(), body.content) {
            (Some("base64") | None, Some(encoded)) => encoding::decode_content(&path, &encoded)?,
            _ => {
                return Err(NotehubError::Unsupported(format!(
                    "'{}' is too large to read inline",
                    path
                )));
            }
        };

        Ok(RemoteFile {
            path: body.path.unwrap_or(path),
            content,
            version_token: VersionToken::new(body.sha),
        })
    }

    /// Write `content` to `path` as one commit.
    ///
    /// With `preceding` the write only succeeds if the stored token still
    /// matches (`Conflict` otherwise). Without it the write creates a new
    /// file and fails with `AlreadyExists` if the path is occupied.
    pub async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        preceding: Option<&VersionToken>,
    ) -> Result<VersionToken> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(NotehubError::Unsupported(
                "cannot write to the repository root".to_string(),
            ));
        }

        let mut body = json!({
            "message": message,
            "content": encoding::encode_content(content),
            "branch": self.credentials.branch(),
        });
        if let Some(token) = preceding {
            body["sha"] = json!(token.as_str());
        }

        let request = self.request(Method::Put, self.contents_url(&path)).json(body);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let err = match response.status {
                401 | 403 => NotehubError::Unauthorized,
                404 => NotehubError::NotFound(path.clone()),
                409 => NotehubError::Conflict(path.clone()),
                422 if preceding.is_some() => NotehubError::Conflict(path.clone()),
                422 => NotehubError::AlreadyExists(path.clone()),
                status => unavailable(&path, status, &response),
            };
            if err.is_conflict() {
                log::warn!("Write to '{}' rejected: stale version token", path);
            }
            return Err(err);
        }

        let sha = response
            .body
            .get("content")
            .and_then(|c| c.get("sha"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                NotehubError::Unavailable(format!("Write to '{}' returned no version token", path))
            })?;

        log::info!("Wrote '{}' ({})", path, message);
        Ok(VersionToken::new(sha))
    }

    /// Perform the single write described by a [`SaveAttempt`].
    pub async fn submit(&self, attempt: SaveAttempt, message: &str) -> Result<VersionToken> {
        self.write(
            &attempt.path,
            &attempt.content,
            message,
            attempt.preceding_token.as_ref(),
        )
        .await
    }

    /// Delete the file at `path`, provided its token is still `token`.
    pub async fn remove(&self, path: &str, token: &VersionToken, message: &str) -> Result<()> {
        let path = normalize_path(path);
        let body = json!({
            "message": message,
            "sha": token.as_str(),
            "branch": self.credentials.branch(),
        });

        let request = self
            .request(Method::Delete, self.contents_url(&path))
            .json(body);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(match response.status {
                401 | 403 => NotehubError::Unauthorized,
                404 => NotehubError::NotFound(path),
                409 | 422 => NotehubError::Conflict(path),
                status => unavailable(&path, status, &response),
            });
        }

        log::info!("Deleted '{}'", path);
        Ok(())
    }

    /// Binary uploads are not supported by this layer.
    pub async fn upload_binary(
        &self,
        path: &str,
        _bytes: &[u8],
        _message: &str,
    ) -> Result<VersionToken> {
        Err(NotehubError::Unsupported(format!(
            "binary upload of '{}' is not supported",
            path
        )))
    }

    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = format!(
            "{}?ref={}",
            self.contents_url(path),
            urlencoding::encode(self.credentials.branch())
        );
        self.transport.send(self.request(Method::Get, url)).await
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();

        format!(
            "{}/repos/{}/{}/contents/{}",
            self.credentials.api_base_url(),
            urlencoding::encode(self.credentials.owner()),
            urlencoding::encode(self.credentials.repo()),
            encoded.join("/")
        )
    }

    fn request(&self, method: Method, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("Authorization", format!("token {}", self.credentials.token()))
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }
}

impl<T: Transport> std::fmt::Debug for RemoteStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

fn read_error(path: &str, response: &HttpResponse) -> NotehubError {
    match response.status {
        401 | 403 => NotehubError::Unauthorized,
        404 => NotehubError::NotFound(path.to_string()),
        status => unavailable(path, status, response),
    }
}

fn unavailable(path: &str, status: u16, response: &HttpResponse) -> NotehubError {
    NotehubError::Unavailable(format!(
        "'{}' returned HTTP {}: {}",
        path,
        status,
        response.message().unwrap_or("no message")
    ))
}

fn malformed(path: &str, err: serde_json::Error) -> NotehubError {
    NotehubError::Unavailable(format!("Unexpected response for '{}': {}", path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_store, store_with};
    use crate::transport::InMemoryBackend;
    use futures_lite::future::block_on;

    #[test]
    fn test_list_filters_to_folders_and_notes() {
        let (store, _backend) = store_with(&[
            ("Notes/a.md", "a"),
            ("Notes/img.png", "binary-ish"),
            ("Notes/sub/b.md", "b"),
        ]);

        let nodes = block_on(store.list("Notes")).unwrap();
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["Notes/a.md", "Notes/sub"]);
        assert!(nodes[1].is_folder());
        assert!(!nodes[1].children.is_loaded());
        assert!(nodes.iter().all(|n| n.version_token.is_some()));
    }

    #[test]
    fn test_list_single_file_yields_one_entry() {
        let (store, _backend) = store_with(&[("Notes/a.md", "a")]);
        let nodes = block_on(store.list("Notes/a.md")).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "a.md");
    }

    #[test]
    fn test_read_directory_is_unsupported() {
        let (store, _backend) = store_with(&[("Notes/a.md", "a")]);
        let err = block_on(store.read("Notes")).unwrap_err();
        assert!(matches!(err, NotehubError::Unsupported(_)));
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let (store, _backend) = memory_store();
        assert!(matches!(
            block_on(store.read("nope.md")),
            Err(NotehubError::NotFound(p)) if p == "nope.md"
        ));
        assert!(matches!(
            block_on(store.list("nope")),
            Err(NotehubError::NotFound(_))
        ));
    }

    #[test]
    fn test_rejected_token_is_unauthorized() {
        let backend = InMemoryBackend::new().with_token("right");
        let credentials = crate::config::Config::new("wrong", "octo", "notes")
            .credentials()
            .unwrap();
        let store = RemoteStore::new(credentials, backend);
        assert!(matches!(
            block_on(store.list("")),
            Err(NotehubError::Unauthorized)
        ));
    }

    #[test]
    fn test_server_errors_are_unavailable() {
        let (store, backend) = store_with(&[("a.md", "a")]);
        backend.inject_status(Method::Get, 503);
        let err = block_on(store.read("a.md")).unwrap_err();
        assert!(err.is_retryable());

        backend.inject_status(Method::Put, 500);
        let err = block_on(store.write("b.md", "b", "Create b.md", None)).unwrap_err();
        assert!(matches!(err, NotehubError::Unavailable(_)));
    }

    #[test]
    fn test_write_without_token_on_occupied_path() {
        let (store, _backend) = store_with(&[("a.md", "original")]);
        let err = block_on(store.write("a.md", "other", "Create a.md", None)).unwrap_err();
        assert!(matches!(err, NotehubError::AlreadyExists(_)));
    }

    #[test]
    fn test_remove_with_stale_token_conflicts() {
        let (store, backend) = store_with(&[("a.md", "one")]);
        let stale = block_on(store.read("a.md")).unwrap().version_token;
        backend.put_file("a.md", "two");

        let err = block_on(store.remove("a.md", &stale, "Delete a.md")).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(backend.get_content("a.md").as_deref(), Some("two"));
    }

    #[test]
    fn test_requests_carry_commit_messages() {
        let (store, backend) = memory_store();
        let token = block_on(store.write("Notes/a.md", "x", "Create Notes/a.md", None)).unwrap();
        block_on(store.remove("Notes/a.md", &token, "Delete Notes/a.md")).unwrap();

        let messages: Vec<String> = backend.commits().into_iter().map(|c| c.message).collect();
        assert_eq!(messages, vec!["Create Notes/a.md", "Delete Notes/a.md"]);
    }

    #[test]
    fn test_paths_with_spaces_are_encoded() {
        let (store, backend) = memory_store();
        block_on(store.write("My Notes/día 1.md", "hola", "Create", None)).unwrap();
        assert_eq!(backend.get_content("My Notes/día 1.md").as_deref(), Some("hola"));
        assert_eq!(
            block_on(store.read("My Notes/día 1.md")).unwrap().content,
            "hola"
        );
    }

    #[test]
    fn test_submit_uses_preceding_token() {
        let (store, backend) = store_with(&[("a.md", "one")]);
        let token = block_on(store.read("a.md")).unwrap().version_token;

        let attempt = SaveAttempt {
            path: "a.md".to_string(),
            content: "two".to_string(),
            preceding_token: Some(token.clone()),
        };
        let next = block_on(store.submit(attempt, "Update a.md")).unwrap();
        assert_ne!(next, token);
        assert_eq!(backend.get_content("a.md").as_deref(), Some("two"));

        let stale = SaveAttempt {
            path: "a.md".to_string(),
            content: "three".to_string(),
            preceding_token: Some(token),
        };
        assert!(block_on(store.submit(stale, "Update a.md")).unwrap_err().is_conflict());
    }

    #[test]
    fn test_upload_binary_is_unsupported() {
        let (store, backend) = memory_store();
        let err = block_on(store.upload_binary("img.png", &[0, 1, 2], "Upload")).unwrap_err();
        assert!(matches!(err, NotehubError::Unsupported(_)));
        assert_eq!(backend.request_count(), 0);
    }
}
