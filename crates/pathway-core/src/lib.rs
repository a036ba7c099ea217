//! Pathway Core
//!
//! Lets a single-page application run server-style request handlers in the
//! page. Link clicks, form submissions and history moves become fabricated
//! requests; the handler's response drives cookies, redirects, refreshes,
//! scrolling and the address bar.
//!
//! ```ignore
//! let server = Server::with_handler(window, |req, res| {
//!     res.end(Some(&render(req.url()))).ok();
//! });
//! server.listen(None);
//! ```

mod config;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::CoreError;
pub use server::{CloseListener, DoneCallback, Server, ServerEvent, ServerListener};

// Re-export the building blocks
pub use pathway_browser::{
    BrowserError, ClickEvent, DomEvent, Element, EventType, FormData, FormElement, MemoryElement,
    MemoryForm, MemoryWindow, Modifiers, ScrollBehavior, SubmitEvent, Window,
};
pub use pathway_http::{
    Connection, File, FileMap, Headers, HttpError, Request, RequestInit, Response,
};
pub use pathway_navigation::{
    NavigationConfig, NavigationController, NavigationError, NavigationTarget, RequestHandler,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
