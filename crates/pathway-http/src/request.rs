//! Incoming request descriptor
//!
//! Mirrors the shape of a server-side request: url, method, headers, parsed
//! body, uploaded files and the connection it came in on. The navigation
//! layer fills in the headers; this type only carries them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::file::FileMap;
use crate::headers::Headers;
use crate::signal::Signal;

pub const HTTP_VERSION_MAJOR: u8 = 1;
pub const HTTP_VERSION_MINOR: u8 = 1;

/// Connection details of the fabricated socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub remote_address: String,
    /// True when the page itself was served over https
    pub encrypted: bool,
}

impl Connection {
    pub fn new(remote_address: impl Into<String>, encrypted: bool) -> Self {
        Self {
            remote_address: remote_address.into(),
            encrypted,
        }
    }
}

/// Caller-supplied parts of a request, before defaults are applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInit {
    pub url: String,
    /// Defaults to GET
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Headers,
    pub body: Option<Value>,
    pub files: Option<FileMap>,
}

impl RequestInit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn files(mut self, files: FileMap) -> Self {
        self.files = Some(files);
        self
    }
}

impl From<&str> for RequestInit {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for RequestInit {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

#[derive(Debug)]
struct RequestInner {
    id: Uuid,
    url: String,
    method: String,
    headers: Headers,
    body: Option<Value>,
    files: Option<FileMap>,
    connection: Connection,
    complete: AtomicBool,
    completed: Signal<Request>,
}

/// Handle to a fabricated request. Clones share the same request.
#[derive(Debug, Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

impl Request {
    /// Build a request from its parts. `headers` is taken as final; the
    /// method is upper-cased and defaults to GET.
    pub fn new(init: RequestInit, connection: Connection) -> Self {
        let method = init
            .method
            .filter(|m| !m.trim().is_empty())
            .map(|m| m.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "GET".to_string());

        Self {
            inner: Arc::new(RequestInner {
                id: Uuid::new_v4(),
                url: init.url,
                method,
                headers: init.headers,
                body: init.body,
                files: init.files,
                connection,
                complete: AtomicBool::new(false),
                completed: Signal::new(),
            }),
        }
    }

    /// Unique id, used to follow a request through the logs
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn method(&self) -> &str {
        &self.inner.method
    }

    pub fn headers(&self) -> &Headers {
        &self.inner.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name)
    }

    pub fn body(&self) -> Option<&Value> {
        self.inner.body.as_ref()
    }

    pub fn files(&self) -> Option<&FileMap> {
        self.inner.files.as_ref()
    }

    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    pub fn http_version_major(&self) -> u8 {
        HTTP_VERSION_MAJOR
    }

    pub fn http_version_minor(&self) -> u8 {
        HTTP_VERSION_MINOR
    }

    pub fn http_version(&self) -> String {
        format!("{}.{}", HTTP_VERSION_MAJOR, HTTP_VERSION_MINOR)
    }

    /// True once the paired response has finished
    pub fn is_complete(&self) -> bool {
        self.inner.complete.load(Ordering::SeqCst)
    }

    /// Run `callback` when the request completes, or right away if it
    /// already has.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(&Request) + Send + 'static,
    {
        if let Err(callback) = self.inner.completed.subscribe(callback) {
            callback(self);
        }
    }

    /// Flag the request complete and notify subscribers. Returns `false` if
    /// it was already complete.
    pub fn mark_complete(&self) -> bool {
        if self.inner.complete.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::trace!(request_id = %self.inner.id, url = %self.inner.url, "Request complete");
        self.inner.completed.emit(self)
    }

    /// True if both handles refer to the same request
    pub fn ptr_eq(&self, other: &Request) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
