//! Pathway Navigation
//!
//! Turns browser navigation into fabricated server traffic:
//! - Link clicks and form submissions are classified and, when same-origin
//!   and unmodified, intercepted
//! - Each navigation emits a request/response pair to the application
//! - A finished response drives cookies, refresh, redirects, scrolling and
//!   history the way a real page load would

mod classifier;
mod controller;
mod cookies;
mod error;
mod query;
mod refresh;

pub use classifier::{
    classify_click, classify_submit, is_external, resolve_same_origin, SubmitNavigation,
};
pub use controller::{
    MAX_REDIRECTS, NavigationConfig, NavigationController, NavigationTarget, RequestHandler,
    WeakNavigationController,
};
pub use cookies::CookieBatch;
pub use error::NavigationError;
pub use query::{flatten_query, with_query};
pub use refresh::RefreshDirective;

pub type Result<T> = std::result::Result<T, NavigationError>;
