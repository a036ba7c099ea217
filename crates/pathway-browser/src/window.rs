//! The window seam
//!
//! A `Window` is the page the emulator runs in. Implementations must be
//! safe to call re-entrantly: listeners and timer callbacks routinely call
//! back into the same window.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::element::Element;
use crate::event::{DomEvent, EventType};

pub type Listener = Arc<dyn Fn(&mut DomEvent) + Send + Sync>;
pub type TimerCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBlock {
    #[default]
    Start,
    Center,
    End,
    Nearest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollIntoViewOptions {
    pub block: ScrollBlock,
    pub behavior: ScrollBehavior,
}

pub trait Window: Send + Sync {
    /// Current address (`location.href`)
    fn location(&self) -> Url;

    /// `document.cookie` as read
    fn document_cookie(&self) -> String;

    /// One `document.cookie = ...` assignment
    fn write_cookie(&self, cookie: &str);

    /// `document.referrer`, empty if none
    fn document_referrer(&self) -> String;

    fn user_agent(&self) -> String;

    fn language(&self) -> String;

    fn push_state(&self, url: &str);

    fn replace_state(&self, url: &str);

    fn element_by_id(&self, id: &str) -> Option<Arc<dyn Element>>;

    fn scroll_into_view(&self, element: &dyn Element, options: ScrollIntoViewOptions);

    fn scroll_to(&self, x: f64, y: f64);

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Clearing an unknown or already-fired timer is a no-op.
    fn clear_timeout(&self, id: TimerId);

    fn add_event_listener(&self, event: EventType, listener: Listener) -> ListenerId;

    fn remove_event_listener(&self, event: EventType, id: ListenerId);
}
