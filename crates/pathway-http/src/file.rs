//! File descriptors attached to form submissions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// File name as reported by the file input
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type, empty when the browser could not guess one
    pub mime_type: String,
}

impl File {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

pub type FileList = Vec<File>;

/// Field name -> selected files
pub type FileMap = BTreeMap<String, FileList>;
