//! Outgoing response descriptor
//!
//! Handlers write headers and a body, then call `end`. Finishing is
//! one-shot; the navigation layer subscribes to it before the handler runs.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::error::HttpError;
use crate::headers::Headers;
use crate::signal::Signal;
use crate::Result;

#[derive(Debug)]
struct ResponseState {
    status_code: u16,
    headers: Headers,
    body: String,
    finished: bool,
}

/// Handle to a fabricated response. Clones share the same response.
#[derive(Clone)]
pub struct Response {
    state: Arc<Mutex<ResponseState>>,
    finished: Signal<Response>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ResponseState {
                status_code: 200,
                headers: Headers::new(),
                body: String::new(),
                finished: false,
            })),
            finished: Signal::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.state.lock().status_code
    }

    pub fn set_status(&self, status_code: u16) -> Result<()> {
        let mut state = self.state.lock();
        if state.finished {
            return Err(HttpError::AlreadyFinished);
        }
        state.status_code = status_code;
        Ok(())
    }

    pub fn set_header(&self, name: &str, value: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock();
        if state.finished {
            return Err(HttpError::HeadersSent(name.to_string()));
        }
        state.headers.set(name, value);
        Ok(())
    }

    pub fn get_header(&self, name: &str) -> Option<String> {
        self.state.lock().headers.get(name).map(str::to_string)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.state.lock().headers.contains(name)
    }

    pub fn remove_header(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.finished {
            return Err(HttpError::HeadersSent(name.to_string()));
        }
        state.headers.remove(name);
        Ok(())
    }

    /// Snapshot of the current headers
    pub fn headers(&self) -> Headers {
        self.state.lock().headers.clone()
    }

    /// Append to the body
    pub fn write(&self, chunk: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.finished {
            return Err(HttpError::AlreadyFinished);
        }
        state.body.push_str(chunk);
        Ok(())
    }

    pub fn body(&self) -> String {
        self.state.lock().body.clone()
    }

    /// Finish the response, optionally writing a last chunk.
    pub fn end(&self, chunk: Option<&str>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.finished {
                return Err(HttpError::AlreadyFinished);
            }
            if let Some(chunk) = chunk {
                state.body.push_str(chunk);
            }
            state.finished = true;
        }

        self.finished.emit(self);
        Ok(())
    }

    /// 302 to `location` and finish.
    pub fn redirect(&self, location: &str) -> Result<()> {
        self.set_status(302)?;
        self.set_header("location", location)?;
        self.end(None)
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Run `callback` once the response finishes, or right away if it
    /// already has.
    pub fn on_finish<F>(&self, callback: F)
    where
        F: FnOnce(&Response) + Send + 'static,
    {
        if let Err(callback) = self.finished.subscribe(callback) {
            callback(self);
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Response")
            .field("status_code", &state.status_code)
            .field("headers", &state.headers)
            .field("finished", &state.finished)
            .finish()
    }
}
