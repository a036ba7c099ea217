//! Pathway Browser Surface
//!
//! Everything the navigation layer needs from the page: location, cookie
//! store, history, navigator, scrolling, timers and the four window events
//! it listens to. `Window` is the seam; `MemoryWindow` is a headless
//! implementation with a virtual clock.

mod element;
mod error;
mod event;
mod memory;
mod window;

pub use element::{Element, FormData, FormElement, FormField, MemoryElement, MemoryForm};
pub use error::BrowserError;
pub use event::{ClickEvent, DomEvent, EventType, Modifiers, SubmitEvent};
pub use memory::{HistoryUpdate, MemoryWindow, ScrollRecord};
pub use window::{
    Listener, ListenerId, ScrollBehavior, ScrollBlock, ScrollIntoViewOptions, TimerCallback,
    TimerId, Window,
};

pub type Result<T> = std::result::Result<T, BrowserError>;
