//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] pathway_http::HttpError),

    #[error("Browser error: {0}")]
    Browser(#[from] pathway_browser::BrowserError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] pathway_navigation::NavigationError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
