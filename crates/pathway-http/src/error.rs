//! HTTP descriptor error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Cannot set header '{0}' after the response has finished")]
    HeadersSent(String),

    #[error("Response already finished")]
    AlreadyFinished,
}
