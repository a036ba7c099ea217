//! Headless in-memory window
//!
//! Keeps a location, a history stack, a flat cookie jar, registered
//! elements and a virtual clock. Timers only fire from `advance`, so tests
//! decide exactly when time passes. No lock is held while listeners or
//! timer callbacks run.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::element::Element;
use crate::event::{ClickEvent, DomEvent, EventType, SubmitEvent};
use crate::window::{
    Listener, ListenerId, ScrollIntoViewOptions, TimerCallback, TimerId, Window,
};
use crate::Result;

/// One `pushState` / `replaceState` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryUpdate {
    pub url: String,
    pub replace: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollRecord {
    IntoView {
        element_id: Option<String>,
        options: ScrollIntoViewOptions,
    },
    To {
        x: f64,
        y: f64,
    },
}

struct PendingTimer {
    due: Duration,
    callback: TimerCallback,
}

struct MemoryState {
    location: Url,
    entries: Vec<Url>,
    cursor: usize,
    history_log: Vec<HistoryUpdate>,
    cookies: Vec<(String, String)>,
    cookie_writes: Vec<String>,
    referrer: String,
    user_agent: String,
    language: String,
    elements: HashMap<String, Arc<dyn Element>>,
    scroll_position: (f64, f64),
    scroll_log: Vec<ScrollRecord>,
    now: Duration,
    timers: BTreeMap<TimerId, PendingTimer>,
    listeners: Vec<(ListenerId, EventType, Listener)>,
    next_id: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryWindow {
    state: Mutex<MemoryState>,
}

impl MemoryWindow {
    pub fn new(url: &str) -> Result<Self> {
        let location = Url::parse(url)?;

        Ok(Self {
            state: Mutex::new(MemoryState {
                entries: vec![location.clone()],
                location,
                cursor: 0,
                history_log: Vec::new(),
                cookies: Vec::new(),
                cookie_writes: Vec::new(),
                referrer: String::new(),
                user_agent: "Mozilla/5.0 (Headless; Pathway MemoryWindow)".to_string(),
                language: "en-US".to_string(),
                elements: HashMap::new(),
                scroll_position: (0.0, 0.0),
                scroll_log: Vec::new(),
                now: Duration::ZERO,
                timers: BTreeMap::new(),
                listeners: Vec::new(),
                next_id: 0,
            }),
        })
    }

    pub fn with_referrer(self, referrer: &str) -> Self {
        self.state.lock().referrer = referrer.to_string();
        self
    }

    pub fn with_user_agent(self, user_agent: &str) -> Self {
        self.state.lock().user_agent = user_agent.to_string();
        self
    }

    pub fn with_language(self, language: &str) -> Self {
        self.state.lock().language = language.to_string();
        self
    }

    /// Make an element findable by its `id`. Elements without one are
    /// ignored.
    pub fn add_element(&self, element: Arc<dyn Element>) {
        match element.id() {
            Some(id) => {
                self.state.lock().elements.insert(id, element);
            }
            None => tracing::warn!(
                node = %element.node_name(),
                "Ignoring element without an id"
            ),
        }
    }

    pub fn remove_element(&self, id: &str) {
        self.state.lock().elements.remove(id);
    }

    // === Events ===

    /// Run every listener registered for the event's type, in registration
    /// order, and hand the event back.
    pub fn dispatch(&self, mut event: DomEvent) -> DomEvent {
        let event_type = event.event_type();
        let listeners: Vec<Listener> = self
            .state
            .lock()
            .listeners
            .iter()
            .filter(|(_, registered, _)| *registered == event_type)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();

        tracing::trace!(event = %event_type, listeners = listeners.len(), "Dispatching event");

        for listener in listeners {
            listener(&mut event);
        }
        event
    }

    /// Dispatch a click. Returns whether the default action was prevented.
    pub fn click(&self, event: ClickEvent) -> bool {
        self.dispatch(DomEvent::Click(event)).default_prevented()
    }

    /// Dispatch a submit. Returns whether the default action was prevented.
    pub fn submit(&self, event: SubmitEvent) -> bool {
        self.dispatch(DomEvent::Submit(event)).default_prevented()
    }

    /// Fire `DOMContentLoaded`
    pub fn load(&self) {
        self.dispatch(DomEvent::ContentLoaded);
    }

    /// Step back one history entry and fire `popstate`. Returns `false` at
    /// the start of history.
    pub fn back(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.cursor == 0 {
                return false;
            }
            state.cursor -= 1;
            state.location = state.entries[state.cursor].clone();
        }
        self.dispatch(DomEvent::PopState);
        true
    }

    /// Step forward one history entry and fire `popstate`. Returns `false`
    /// at the end of history.
    pub fn forward(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.cursor + 1 >= state.entries.len() {
                return false;
            }
            state.cursor += 1;
            state.location = state.entries[state.cursor].clone();
        }
        self.dispatch(DomEvent::PopState);
        true
    }

    pub fn listener_count(&self, event: EventType) -> usize {
        self.state
            .lock()
            .listeners
            .iter()
            .filter(|(_, registered, _)| *registered == event)
            .count()
    }

    // === Clock ===

    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Move the clock forward by `delta`, firing due timers in order of due
    /// time. Timers scheduled by those callbacks fire too if they fall
    /// inside the window. Returns the number of callbacks run.
    pub fn advance(&self, delta: Duration) -> usize {
        let deadline = self.state.lock().now.saturating_add(delta);
        let mut fired = 0;

        loop {
            let callback = {
                let mut state = self.state.lock();
                let next = state
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.due <= deadline)
                    .min_by_key(|(id, timer)| (timer.due, **id))
                    .map(|(id, _)| *id);

                match next.and_then(|id| state.timers.remove(&id)) {
                    Some(timer) => {
                        state.now = state.now.max(timer.due);
                        Some(timer.callback)
                    }
                    None => {
                        state.now = deadline;
                        None
                    }
                }
            };

            match callback {
                Some(callback) => {
                    callback();
                    fired += 1;
                }
                None => break,
            }
        }

        fired
    }

    /// Fire timers that are already due
    pub fn run_pending(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    pub fn pending_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    // === Inspection ===

    pub fn location_href(&self) -> String {
        self.state.lock().location.to_string()
    }

    pub fn history_log(&self) -> Vec<HistoryUpdate> {
        self.state.lock().history_log.clone()
    }

    /// Number of entries on the history stack
    pub fn history_len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Every raw assignment made through `write_cookie`
    pub fn cookie_writes(&self) -> Vec<String> {
        self.state.lock().cookie_writes.clone()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        self.state.lock().scroll_position
    }

    pub fn scroll_log(&self) -> Vec<ScrollRecord> {
        self.state.lock().scroll_log.clone()
    }

    pub fn set_scroll_position(&self, x: f64, y: f64) {
        self.state.lock().scroll_position = (x, y);
    }

    fn record_history(&self, url: &str, replace: bool) {
        let mut state = self.state.lock();
        let resolved = match state.location.join(url) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Ignoring history update with bad URL");
                return;
            }
        };

        if replace {
            let cursor = state.cursor;
            state.entries[cursor] = resolved.clone();
        } else {
            let keep = state.cursor + 1;
            state.entries.truncate(keep);
            state.entries.push(resolved.clone());
            state.cursor = state.entries.len() - 1;
        }

        state.history_log.push(HistoryUpdate {
            url: resolved.to_string(),
            replace,
        });
        state.location = resolved;
    }
}

/// Apply one `name=value; attr...` write to a flat jar. A non-positive
/// `max-age` deletes.
fn store_cookie(jar: &mut Vec<(String, String)>, cookie: &str) {
    let mut parts = cookie.split(';');
    let Some(pair) = parts.next() else {
        return;
    };
    let (name, value) = match pair.split_once('=') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => ("", pair.trim()),
    };

    let expired = parts.any(|attr| {
        let (key, value) = attr.split_once('=').unwrap_or((attr, ""));
        key.trim().eq_ignore_ascii_case("max-age")
            && value.trim().parse::<i64>().map(|n| n <= 0).unwrap_or(false)
    });

    let existing = jar.iter().position(|(n, _)| n == name);
    match (existing, expired) {
        (Some(index), true) => {
            jar.remove(index);
        }
        (Some(index), false) => jar[index].1 = value.to_string(),
        (None, false) => jar.push((name.to_string(), value.to_string())),
        (None, true) => {}
    }
}

impl Window for MemoryWindow {
    fn location(&self) -> Url {
        self.state.lock().location.clone()
    }

    fn document_cookie(&self) -> String {
        self.state
            .lock()
            .cookies
            .iter()
            .map(|(name, value)| {
                if name.is_empty() {
                    value.clone()
                } else {
                    format!("{}={}", name, value)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write_cookie(&self, cookie: &str) {
        let mut state = self.state.lock();
        state.cookie_writes.push(cookie.to_string());
        store_cookie(&mut state.cookies, cookie);
    }

    fn document_referrer(&self) -> String {
        self.state.lock().referrer.clone()
    }

    fn user_agent(&self) -> String {
        self.state.lock().user_agent.clone()
    }

    fn language(&self) -> String {
        self.state.lock().language.clone()
    }

    fn push_state(&self, url: &str) {
        self.record_history(url, false);
    }

    fn replace_state(&self, url: &str) {
        self.record_history(url, true);
    }

    fn element_by_id(&self, id: &str) -> Option<Arc<dyn Element>> {
        self.state.lock().elements.get(id).cloned()
    }

    fn scroll_into_view(&self, element: &dyn Element, options: ScrollIntoViewOptions) {
        self.state.lock().scroll_log.push(ScrollRecord::IntoView {
            element_id: element.id(),
            options,
        });
    }

    fn scroll_to(&self, x: f64, y: f64) {
        let mut state = self.state.lock();
        state.scroll_position = (x, y);
        state.scroll_log.push(ScrollRecord::To { x, y });
    }

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let mut state = self.state.lock();
        let id = TimerId(state.next_id());
        let due = state.now.saturating_add(delay);
        state.timers.insert(id, PendingTimer { due, callback });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.state.lock().timers.remove(&id);
    }

    fn add_event_listener(&self, event: EventType, listener: Listener) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_id());
        state.listeners.push((id, event, listener));
        id
    }

    fn remove_event_listener(&self, event: EventType, id: ListenerId) {
        self.state
            .lock()
            .listeners
            .retain(|(registered_id, registered, _)| !(*registered_id == id && *registered == event));
    }
}

impl fmt::Debug for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryWindow")
            .field("location", &state.location.as_str())
            .field("history_len", &state.entries.len())
            .field("now", &state.now)
            .field("pending_timers", &state.timers.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::MemoryElement;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_invalid_start_url() {
        assert!(MemoryWindow::new("not a url").is_err());
    }

    #[test]
    fn test_history_push_replace_and_back() {
        let window = MemoryWindow::new("http://app.test/").unwrap();

        window.push_state("/a");
        window.push_state("/b");
        window.replace_state("/c");
        assert_eq!(window.location_href(), "http://app.test/c");
        assert_eq!(window.history_len(), 3);

        let log = window.history_log();
        assert_eq!(log.len(), 3);
        assert!(!log[0].replace);
        assert!(log[2].replace);

        assert!(window.back());
        assert_eq!(window.location_href(), "http://app.test/a");

        // Pushing after going back drops the forward entries.
        window.push_state("/d");
        assert_eq!(window.history_len(), 3);
        assert!(!window.forward());
    }

    #[test]
    fn test_cookie_jar() {
        let window = MemoryWindow::new("http://app.test/").unwrap();

        window.write_cookie("a=1; path=/");
        window.write_cookie("b=2");
        window.write_cookie("a=3");
        assert_eq!(window.document_cookie(), "a=3; b=2");

        window.write_cookie("b=gone; Max-Age=0");
        assert_eq!(window.document_cookie(), "a=3");
        assert_eq!(window.cookie("b"), None);
        assert_eq!(window.cookie_writes().len(), 4);
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let window = Arc::new(MemoryWindow::new("http://app.test/").unwrap());
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, ms) in [("late", 300u64), ("early", 100), ("cancelled", 200)] {
            let order = Arc::clone(&order);
            let id = window.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || order.lock().push(label)),
            );
            if label == "cancelled" {
                window.clear_timeout(id);
            }
        }

        assert_eq!(window.advance(Duration::from_millis(150)), 1);
        assert_eq!(*order.lock(), vec!["early"]);
        assert_eq!(window.now(), Duration::from_millis(150));

        assert_eq!(window.advance(Duration::from_millis(1000)), 1);
        assert_eq!(*order.lock(), vec!["early", "late"]);
        assert_eq!(window.pending_timers(), 0);
    }

    #[test]
    fn test_huge_delays_saturate() {
        let window = MemoryWindow::new("http://app.test/").unwrap();
        window.advance(Duration::from_secs(2));

        window.set_timeout(Duration::MAX, Box::new(|| {}));
        assert_eq!(window.advance(Duration::from_secs(60)), 0);
        assert_eq!(window.pending_timers(), 1);

        assert_eq!(window.advance(Duration::MAX), 1);
        assert_eq!(window.now(), Duration::MAX);
    }

    #[test]
    fn test_timer_callbacks_can_schedule_more() {
        let window = Arc::new(MemoryWindow::new("http://app.test/").unwrap());
        let fired = Arc::new(AtomicUsize::new(0));

        let inner_window = Arc::clone(&window);
        let counter = Arc::clone(&fired);
        window.set_timeout(
            Duration::ZERO,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let counter = Arc::clone(&counter);
                inner_window.set_timeout(
                    Duration::from_millis(10),
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        assert_eq!(window.run_pending(), 1);
        assert_eq!(window.advance(Duration::from_millis(10)), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispatch_reaches_matching_listeners() {
        let window = MemoryWindow::new("http://app.test/").unwrap();
        let clicks = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&clicks);
        let id = window.add_event_listener(
            EventType::Click,
            Arc::new(move |event: &mut DomEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
                if let DomEvent::Click(click) = event {
                    click.prevent_default();
                }
            }),
        );

        let anchor: Arc<dyn Element> = Arc::new(MemoryElement::anchor("/x"));
        assert!(window.click(ClickEvent::new(Arc::clone(&anchor))));
        window.load();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        window.remove_event_listener(EventType::Click, id);
        assert_eq!(window.listener_count(EventType::Click), 0);
        assert!(!window.click(ClickEvent::new(anchor)));
    }

    #[test]
    fn test_elements_by_id() {
        let window = MemoryWindow::new("http://app.test/").unwrap();
        window.add_element(Arc::new(MemoryElement::new("h2").attr("id", "intro")));
        window.add_element(Arc::new(MemoryElement::new("p")));

        let found = window.element_by_id("intro").unwrap();
        window.scroll_into_view(found.as_ref(), ScrollIntoViewOptions::default());
        assert_eq!(
            window.scroll_log(),
            vec![ScrollRecord::IntoView {
                element_id: Some("intro".to_string()),
                options: ScrollIntoViewOptions::default(),
            }]
        );
        assert!(window.element_by_id("missing").is_none());

        window.remove_element("intro");
        assert!(window.element_by_id("intro").is_none());
    }

    #[test]
    fn test_navigator_overrides() {
        let window = MemoryWindow::new("http://app.test/")
            .unwrap()
            .with_user_agent("pathway-test/1.0")
            .with_language("de-DE")
            .with_referrer("http://search.test/");

        assert_eq!(window.user_agent(), "pathway-test/1.0");
        assert_eq!(window.language(), "de-DE");
        assert_eq!(window.document_referrer(), "http://search.test/");
    }
}
