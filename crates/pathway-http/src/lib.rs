//! Pathway HTTP descriptors
//!
//! Stand-ins for the request and response objects a server-side handler
//! expects. Nothing here touches the network: a request is built from a
//! navigation, a response is finished by the handler, and the navigation
//! layer reads the headers back out.

mod error;
mod file;
mod headers;
mod request;
mod response;
mod signal;

pub use error::HttpError;
pub use file::{File, FileList, FileMap};
pub use headers::Headers;
pub use request::{Connection, Request, RequestInit, HTTP_VERSION_MAJOR, HTTP_VERSION_MINOR};
pub use response::Response;
pub use signal::{Listener, Signal};

pub type Result<T> = std::result::Result<T, HttpError>;
