//! Server facade
//!
//! The object applications construct. It looks like a server: register a
//! request handler, `listen`, `close`. Underneath, `listen` attaches the
//! four window listeners and every navigation goes through the
//! `NavigationController`.

use parking_lot::{Mutex, RwLock};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use pathway_browser::{DomEvent, EventType, Listener, ListenerId, Window};
use pathway_http::{Request, Response};
use pathway_navigation::{NavigationController, NavigationTarget, RequestHandler};

use crate::config::ServerConfig;
use crate::error::CoreError;
use crate::Result;

pub type CloseListener = Arc<dyn Fn() + Send + Sync>;

/// Completion callback for `listen` / `close`, run on the next turn
pub type DoneCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEvent {
    Request,
    Close,
}

impl ServerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerEvent::Request => "request",
            ServerEvent::Close => "close",
        }
    }
}

impl FromStr for ServerEvent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "request" => Ok(ServerEvent::Request),
            "close" => Ok(ServerEvent::Close),
            _ => Err(CoreError::InvalidArgument(format!("Unknown server event: {}", s))),
        }
    }
}

/// A listener for `Server::on`
pub enum ServerListener {
    Request(RequestHandler),
    Close(CloseListener),
}

impl ServerListener {
    fn kind(&self) -> ServerEvent {
        match self {
            ServerListener::Request(_) => ServerEvent::Request,
            ServerListener::Close(_) => ServerEvent::Close,
        }
    }
}

pub struct Server {
    config: ServerConfig,
    controller: NavigationController,
    close_listeners: RwLock<Vec<CloseListener>>,
    /// Window listeners attached by `listen`
    attached: Mutex<Vec<(EventType, ListenerId)>>,
}

impl Server {
    pub fn new(window: Arc<dyn Window>) -> Self {
        Self::with_config(window, ServerConfig::default())
    }

    pub fn with_config(window: Arc<dyn Window>, config: ServerConfig) -> Self {
        let controller = NavigationController::new(window, config.navigation());

        Self {
            config,
            controller,
            close_listeners: RwLock::new(Vec::new()),
            attached: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for `new` followed by `on_request`
    pub fn with_handler<F>(window: Arc<dyn Window>, handler: F) -> Self
    where
        F: Fn(Request, Response) + Send + Sync + 'static,
    {
        let server = Self::new(window);
        server.on_request(handler);
        server
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    pub fn on_request<F>(&self, handler: F) -> &Self
    where
        F: Fn(Request, Response) + Send + Sync + 'static,
    {
        self.controller.add_handler(Arc::new(handler));
        self
    }

    pub fn on_close<F>(&self, listener: F) -> &Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.close_listeners.write().push(Arc::new(listener));
        self
    }

    /// Register a listener by event name. Fails with `InvalidArgument` for an
    /// unknown name or a listener of the wrong kind.
    pub fn on(&self, event: &str, listener: ServerListener) -> Result<&Self> {
        let event: ServerEvent = event.parse()?;
        if listener.kind() != event {
            return Err(CoreError::InvalidArgument(format!(
                "Listener for '{}' must be a {} listener",
                event.as_str(),
                event.as_str()
            )));
        }

        match listener {
            ServerListener::Request(handler) => self.controller.add_handler(handler),
            ServerListener::Close(listener) => self.close_listeners.write().push(listener),
        }
        Ok(self)
    }

    /// Attach the `DOMContentLoaded`, `popstate`, `submit` and `click`
    /// listeners. Listening twice keeps the first set of listeners.
    pub fn listen(&self, callback: Option<DoneCallback>) -> &Self {
        {
            let mut attached = self.attached.lock();
            if attached.is_empty() {
                self.controller.reset();
                let window = self.controller.window();
                for event_type in EventType::ALL {
                    let controller = self.controller.downgrade();
                    let listener: Listener = Arc::new(move |event: &mut DomEvent| {
                        if let Some(controller) = controller.upgrade() {
                            controller.handle_event(event);
                        }
                    });
                    attached.push((event_type, window.add_event_listener(event_type, listener)));
                }
                tracing::info!(
                    location = %window.location(),
                    handlers = self.controller.handler_count(),
                    "Server listening"
                );
            } else {
                tracing::warn!("Server is already listening");
            }
        }

        if let Some(callback) = callback {
            self.defer(callback);
        }
        self
    }

    /// Detach the window listeners and notify close listeners. A scheduled
    /// refresh is dropped when `cancel_refresh_on_close` is set; navigations
    /// still waiting on their handler are left alone.
    pub fn close(&self, callback: Option<DoneCallback>) -> &Self {
        let detached = self.detach();

        if self.config.cancel_refresh_on_close {
            self.controller.cancel_pending_refresh();
        }
        self.controller.reset();

        tracing::info!(listeners = detached, "Server closed");

        if let Some(callback) = callback {
            self.defer(callback);
        }

        let listeners: Vec<CloseListener> = self.close_listeners.read().clone();
        for listener in listeners {
            listener();
        }
        self
    }

    pub fn is_listening(&self) -> bool {
        !self.attached.lock().is_empty()
    }

    /// Navigate programmatically. `replace_state` replaces the current
    /// history entry instead of pushing a new one.
    pub fn navigate(&self, target: impl Into<NavigationTarget>, replace_state: bool) -> Request {
        self.controller.navigate(target, replace_state)
    }

    fn detach(&self) -> usize {
        let attached = std::mem::take(&mut *self.attached.lock());
        let window = self.controller.window();
        for (event_type, id) in &attached {
            window.remove_event_listener(*event_type, *id);
        }
        attached.len()
    }

    fn defer(&self, callback: DoneCallback) {
        self.controller
            .window()
            .set_timeout(Duration::ZERO, callback);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.detach();
    }
}
