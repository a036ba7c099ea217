//! Browser error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
