//! Navigation error types
//!
//! These never reach the embedder from event handling: a rejected link is
//! left to the browser. They exist so the reason can be logged.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Cross-origin URL: {0}")]
    CrossOrigin(String),
}
