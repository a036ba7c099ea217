//! DOM events the emulator consumes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::element::{Element, FormElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    DomContentLoaded,
    PopState,
    Submit,
    Click,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::DomContentLoaded,
        EventType::PopState,
        EventType::Submit,
        EventType::Click,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DomContentLoaded => "DOMContentLoaded",
            EventType::PopState => "popstate",
            EventType::Submit => "submit",
            EventType::Click => "click",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct ClickEvent {
    /// Innermost element that was clicked
    pub target: Option<Arc<dyn Element>>,
    /// 0 is the primary button
    pub button: i16,
    pub modifiers: Modifiers,
    default_prevented: bool,
}

impl ClickEvent {
    /// A plain primary-button click on `target`
    pub fn new(target: Arc<dyn Element>) -> Self {
        Self {
            target: Some(target),
            button: 0,
            modifiers: Modifiers::default(),
            default_prevented: false,
        }
    }

    pub fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl fmt::Debug for ClickEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickEvent")
            .field("target", &self.target.as_ref().map(|t| t.node_name()))
            .field("button", &self.button)
            .field("modifiers", &self.modifiers)
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}

#[derive(Clone)]
pub struct SubmitEvent {
    pub form: Arc<dyn FormElement>,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(form: Arc<dyn FormElement>) -> Self {
        Self {
            form,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl fmt::Debug for SubmitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitEvent")
            .field("action", &self.form.action())
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum DomEvent {
    ContentLoaded,
    PopState,
    Submit(SubmitEvent),
    Click(ClickEvent),
}

impl DomEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            DomEvent::ContentLoaded => EventType::DomContentLoaded,
            DomEvent::PopState => EventType::PopState,
            DomEvent::Submit(_) => EventType::Submit,
            DomEvent::Click(_) => EventType::Click,
        }
    }

    /// Load and popstate events have no default action to prevent.
    pub fn default_prevented(&self) -> bool {
        match self {
            DomEvent::Submit(event) => event.default_prevented(),
            DomEvent::Click(event) => event.default_prevented(),
            DomEvent::ContentLoaded | DomEvent::PopState => false,
        }
    }
}
