//! Server configuration

use pathway_browser::ScrollBehavior;
use pathway_http::Headers;
use pathway_navigation::NavigationConfig;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// How fragment targets are scrolled into view
    pub scroll_behavior: ScrollBehavior,
    /// Forms with this attribute keep their values after submission
    pub no_reset_attribute: String,
    /// Reported as the request's remote address
    pub remote_address: String,
    /// Drop a scheduled refresh when the server closes
    pub cancel_refresh_on_close: bool,
    /// Sent with every request unless the caller overrides them
    pub default_headers: Headers,
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn navigation(&self) -> NavigationConfig {
        NavigationConfig {
            scroll_behavior: self.scroll_behavior,
            no_reset_attribute: self.no_reset_attribute.clone(),
            remote_address: self.remote_address.clone(),
            default_headers: self.default_headers.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            scroll_behavior: ScrollBehavior::Smooth,
            no_reset_attribute: "data-noreset".to_string(),
            remote_address: "127.0.0.1".to_string(),
            cancel_refresh_on_close: true,
            default_headers: Headers::new(),
        }
    }
}
