//! Navigation controller
//!
//! Owns the emulator's running state and drives one request/response cycle
//! per navigation:
//!
//! ```text
//! navigate(target)
//!   -> build request (referer = previous URL)
//!   -> subscribe to response finish
//!   -> emit (request, response) to handlers
//! response finished
//!   -> mark request complete
//!   -> cancel pending refresh
//!   -> set-cookie, refresh, location
//!   -> GET only: scroll, then push/replace history
//! ```
//!
//! Navigations are neither queued nor deduplicated. Each one applies its own
//! effects whenever its response finishes.
//!
//! A redirect chain follows at most `MAX_REDIRECTS` hops. A `location` past
//! that is logged and dropped, ending the chain with no further effects.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use pathway_browser::{
    DomEvent, ScrollBehavior, ScrollBlock, ScrollIntoViewOptions, TimerId, Window,
};
use pathway_http::{Connection, Headers, Request, RequestInit, Response};
use std::sync::{Arc, Weak};
use url::Url;

use crate::classifier::{classify_click, classify_submit};
use crate::cookies::CookieBatch;
use crate::refresh::RefreshDirective;

/// Redirect hops followed from one navigation, as browsers cap them
pub const MAX_REDIRECTS: u32 = 20;

/// Application handler: receives every fabricated request with its response.
pub type RequestHandler = Arc<dyn Fn(Request, Response) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Behavior used when scrolling a fragment target into view
    pub scroll_behavior: ScrollBehavior,
    /// Forms carrying this attribute are not reset after submission
    pub no_reset_attribute: String,
    pub remote_address: String,
    /// Added to every request before caller-supplied headers
    pub default_headers: Headers,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            scroll_behavior: ScrollBehavior::Smooth,
            no_reset_attribute: "data-noreset".to_string(),
            remote_address: "127.0.0.1".to_string(),
            default_headers: Headers::new(),
        }
    }
}

/// What `navigate` accepts
#[derive(Debug, Clone)]
pub enum NavigationTarget {
    Url(String),
    Init(RequestInit),
    /// An already-built request, used as-is
    Request(Request),
}

impl From<&str> for NavigationTarget {
    fn from(url: &str) -> Self {
        NavigationTarget::Url(url.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(url: String) -> Self {
        NavigationTarget::Url(url)
    }
}

impl From<&Url> for NavigationTarget {
    fn from(url: &Url) -> Self {
        NavigationTarget::Url(url.to_string())
    }
}

impl From<RequestInit> for NavigationTarget {
    fn from(init: RequestInit) -> Self {
        NavigationTarget::Init(init)
    }
}

impl From<Request> for NavigationTarget {
    fn from(request: Request) -> Self {
        NavigationTarget::Request(request)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingRefresh {
    timer: TimerId,
    generation: u64,
}

#[derive(Debug, Default)]
struct ControllerState {
    /// Set once the first GET navigation has completed
    started: bool,
    /// The single refresh slot. Scheduling replaces it, every completed
    /// navigation clears it.
    pending_refresh: Option<PendingRefresh>,
    refresh_generation: u64,
    /// URL of the most recently built request, sent as the next `referer`
    last_url: Option<String>,
}

struct ControllerInner {
    window: Arc<dyn Window>,
    config: NavigationConfig,
    handlers: RwLock<Vec<RequestHandler>>,
    state: Mutex<ControllerState>,
}

/// Cheap-clone handle; clones drive the same state.
#[derive(Clone)]
pub struct NavigationController {
    inner: Arc<ControllerInner>,
}

/// Non-owning handle, for callbacks stored inside the window
#[derive(Clone)]
pub struct WeakNavigationController {
    inner: Weak<ControllerInner>,
}

impl WeakNavigationController {
    pub fn upgrade(&self) -> Option<NavigationController> {
        self.inner
            .upgrade()
            .map(|inner| NavigationController { inner })
    }
}

impl NavigationController {
    pub fn new(window: Arc<dyn Window>, config: NavigationConfig) -> Self {
        let referrer = window.document_referrer();
        let state = ControllerState {
            last_url: Some(referrer).filter(|r| !r.is_empty()),
            ..ControllerState::default()
        };

        Self {
            inner: Arc::new(ControllerInner {
                window,
                config,
                handlers: RwLock::new(Vec::new()),
                state: Mutex::new(state),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakNavigationController {
        WeakNavigationController {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn window(&self) -> &Arc<dyn Window> {
        &self.inner.window
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.inner.config
    }

    pub fn add_handler(&self, handler: RequestHandler) {
        self.inner.handlers.write().push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.read().len()
    }

    pub fn is_started(&self) -> bool {
        self.inner.state.lock().started
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.inner.state.lock().pending_refresh.is_some()
    }

    /// The `referer` the next built request will carry
    pub fn last_url(&self) -> Option<String> {
        self.inner.state.lock().last_url.clone()
    }

    /// Forget scroll state so the next navigation is treated as the first.
    pub fn reset(&self) {
        self.inner.state.lock().started = false;
    }

    /// Build the canonical request for `init`: default headers, then
    /// configured headers, then the caller's. Records its URL as the next
    /// referer.
    pub fn build_request(&self, init: RequestInit) -> Request {
        let window = &self.inner.window;
        let location = window.location();

        let referer = {
            let mut state = self.inner.state.lock();
            state.last_url.replace(init.url.clone())
        };

        let mut headers = Headers::new();
        headers.set("host", location_host(&location));
        headers.set("cookie", window.document_cookie());
        headers.set("user-agent", window.user_agent());
        headers.set("accept-language", window.language());
        headers.set("accept", "*/*");
        headers.set("cache-control", "max-age=0");
        headers.set("connection", "keep-alive");
        headers.set("date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        if let Some(referer) = referer {
            headers.set("referer", referer);
        }
        headers.merge(&self.inner.config.default_headers);
        headers.merge(&init.headers);

        let connection = Connection::new(
            self.inner.config.remote_address.as_str(),
            location.scheme() == "https",
        );

        Request::new(RequestInit { headers, ..init }, connection)
    }

    /// Run one navigation. Returns the request that was emitted.
    pub fn navigate(&self, target: impl Into<NavigationTarget>, replace_state: bool) -> Request {
        self.dispatch(target.into(), replace_state, 0)
    }

    /// `redirects` counts the hops already followed to reach `target`.
    fn dispatch(&self, target: NavigationTarget, replace_state: bool, redirects: u32) -> Request {
        let request = match target {
            NavigationTarget::Url(url) => self.build_request(RequestInit::new(url)),
            NavigationTarget::Init(init) => self.build_request(init),
            NavigationTarget::Request(request) => request,
        };
        let response = Response::new();

        // Subscribe first: handlers may finish synchronously.
        let controller = self.clone();
        let finished = request.clone();
        response.on_finish(move |response| {
            controller.complete(&finished, response, replace_state, redirects)
        });

        tracing::debug!(
            request_id = %request.id(),
            url = %request.url(),
            method = %request.method(),
            replace_state,
            "Emitting navigation"
        );

        let handlers: Vec<RequestHandler> = self.inner.handlers.read().clone();
        if handlers.is_empty() {
            tracing::warn!(url = %request.url(), "No request handler registered; navigation stays pending");
        }
        for handler in handlers {
            handler(request.clone(), response.clone());
        }

        request
    }

    /// Route a window event to the matching behavior
    pub fn handle_event(&self, event: &mut DomEvent) {
        match event {
            DomEvent::ContentLoaded | DomEvent::PopState => self.on_url_change(),
            DomEvent::Click(click) => {
                if let Some(url) = classify_click(click, &self.inner.window.location()) {
                    click.prevent_default();
                    self.navigate(url, false);
                }
            }
            DomEvent::Submit(submit) => {
                let location = self.inner.window.location();
                let no_reset = &self.inner.config.no_reset_attribute;
                if let Some(navigation) = classify_submit(submit, &location, no_reset) {
                    self.navigate(navigation.request, false);
                    if navigation.reset_form {
                        submit.form.reset();
                    }
                    submit.prevent_default();
                }
            }
        }
    }

    /// Cancel the scheduled refresh, if any. Returns whether one was pending.
    pub fn cancel_pending_refresh(&self) -> bool {
        let pending = self.inner.state.lock().pending_refresh.take();
        match pending {
            Some(pending) => {
                self.inner.window.clear_timeout(pending.timer);
                tracing::debug!(timer = ?pending.timer, "Cancelled pending refresh");
                true
            }
            None => false,
        }
    }

    fn on_url_change(&self) {
        let href = self.inner.window.location().to_string();
        self.navigate(href, true);
    }

    fn complete(
        &self,
        request: &Request,
        response: &Response,
        replace_state: bool,
        redirects: u32,
    ) {
        request.mark_complete();
        self.cancel_pending_refresh();

        if let Some(cookies) = response.get_header("set-cookie") {
            self.write_cookies(&cookies);
        }

        if let Some(refresh) = response.get_header("refresh") {
            self.schedule_refresh(RefreshDirective::parse(&refresh), request.url());
        }

        if let Some(location) = response.get_header("location") {
            if redirects >= MAX_REDIRECTS {
                tracing::warn!(
                    request_id = %request.id(),
                    from = %request.url(),
                    to = %location,
                    redirects,
                    "Too many redirects; dropping"
                );
                return;
            }
            tracing::info!(
                request_id = %request.id(),
                from = %request.url(),
                to = %location,
                "Following redirect"
            );
            self.dispatch(location.into(), false, redirects + 1);
            return;
        }

        // Mutating requests only move the address through location/refresh.
        if request.method() != "GET" {
            return;
        }

        self.update_scroll(request.url());

        let window = &self.inner.window;
        if replace_state {
            window.replace_state(request.url());
        } else {
            window.push_state(request.url());
        }
        tracing::debug!(url = %request.url(), replace_state, "Updated history");
    }

    fn write_cookies(&self, header: &str) {
        let batch = CookieBatch::parse(header);
        for cookie in batch.writes() {
            self.inner.window.write_cookie(&cookie);
        }
        tracing::debug!(count = batch.len(), "Wrote cookies");
    }

    /// Put `directive` in the refresh slot. At most one refresh is ever
    /// scheduled; a newer one replaces the older.
    fn schedule_refresh(&self, directive: RefreshDirective, current_url: &str) {
        self.cancel_pending_refresh();

        let target = directive.url.unwrap_or_else(|| current_url.to_string());
        let generation = {
            let mut state = self.inner.state.lock();
            state.refresh_generation += 1;
            state.refresh_generation
        };

        let weak = self.downgrade();
        let fire_target = target.clone();
        let timer = self.inner.window.set_timeout(
            directive.delay,
            Box::new(move || {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                {
                    let mut state = controller.inner.state.lock();
                    if state.pending_refresh.map(|p| p.generation) == Some(generation) {
                        state.pending_refresh = None;
                    }
                }
                tracing::info!(url = %fire_target, "Refresh timer fired");
                controller.navigate(fire_target, true);
            }),
        );

        self.inner.state.lock().pending_refresh = Some(PendingRefresh { timer, generation });
        tracing::debug!(url = %target, delay_ms = directive.delay.as_millis() as u64, "Scheduled refresh");
    }

    fn update_scroll(&self, url: &str) {
        let window = &self.inner.window;
        let target = fragment(url).and_then(|id| window.element_by_id(id));

        let started = self.inner.state.lock().started;
        match target {
            Some(element) => window.scroll_into_view(
                element.as_ref(),
                ScrollIntoViewOptions {
                    block: ScrollBlock::Start,
                    behavior: self.inner.config.scroll_behavior,
                },
            ),
            // The very first navigation keeps the browser's own restored position.
            None if started => window.scroll_to(0.0, 0.0),
            None => {}
        }

        self.inner.state.lock().started = true;
    }
}

/// `host[:port]`, as `location.host` reports it
fn location_host(location: &Url) -> String {
    match (location.host_str(), location.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Text after the first `#`, if any
fn fragment(url: &str) -> Option<&str> {
    url.split_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_browser::{HistoryUpdate, MemoryElement, MemoryWindow, ScrollRecord};
    use std::time::Duration;

    fn setup(url: &str) -> (Arc<MemoryWindow>, NavigationController) {
        let window = Arc::new(MemoryWindow::new(url).unwrap());
        let controller = NavigationController::new(window.clone(), NavigationConfig::default());
        (window, controller)
    }

    /// Handler that finishes every response right away after `prepare`
    fn finishing<F>(prepare: F) -> RequestHandler
    where
        F: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        Arc::new(move |req: Request, res: Response| {
            prepare(&req, &res);
            res.end(None).unwrap();
        })
    }

    #[test]
    fn test_fragment() {
        assert_eq!(fragment("/a#top"), Some("top"));
        assert_eq!(fragment("/a#"), None);
        assert_eq!(fragment("/a"), None);
        assert_eq!(fragment("/a#b#c"), Some("b#c"));
    }

    #[test]
    fn test_location_host_keeps_port() {
        let url = Url::parse("http://app.test:8080/x").unwrap();
        assert_eq!(location_host(&url), "app.test:8080");
        let url = Url::parse("https://app.test/x").unwrap();
        assert_eq!(location_host(&url), "app.test");
    }

    #[test]
    fn test_request_headers_and_referer_chain() {
        let window = Arc::new(
            MemoryWindow::new("https://app.test/")
                .unwrap()
                .with_referrer("https://search.test/")
                .with_language("fr-FR"),
        );
        window.write_cookie("sid=1");
        let controller = NavigationController::new(window.clone(), NavigationConfig::default());

        let first = controller.build_request(RequestInit::new("/a").header("X-Trace", "on"));
        assert_eq!(first.header("host"), Some("app.test"));
        assert_eq!(first.header("cookie"), Some("sid=1"));
        assert_eq!(first.header("accept-language"), Some("fr-FR"));
        assert_eq!(first.header("referer"), Some("https://search.test/"));
        assert_eq!(first.header("x-trace"), Some("on"));
        assert!(first.header("date").unwrap().ends_with("GMT"));
        assert!(first.connection().encrypted);

        // The referer moves forward as soon as a request is built.
        let second = controller.build_request(RequestInit::new("/b"));
        assert_eq!(second.header("referer"), Some("/a"));
        assert_eq!(controller.last_url(), Some("/b".to_string()));
    }

    #[test]
    fn test_no_referer_without_history() {
        let (_window, controller) = setup("http://app.test/");
        let request = controller.build_request(RequestInit::new("/"));
        assert!(request.header("referer").is_none());
        assert!(!request.connection().encrypted);
    }

    #[test]
    fn test_caller_headers_win() {
        let window = Arc::new(MemoryWindow::new("http://app.test/").unwrap());
        let mut config = NavigationConfig::default();
        config.default_headers.set("accept", "text/html");
        config.default_headers.set("x-app", "pathway");
        let controller = NavigationController::new(window, config);

        let request = controller.build_request(RequestInit::new("/").header("X-App", "custom"));
        assert_eq!(request.header("accept"), Some("text/html"));
        assert_eq!(request.header("x-app"), Some("custom"));
    }

    #[test]
    fn test_connection_and_navigator_headers() {
        let window = Arc::new(
            MemoryWindow::new("https://app.test/")
                .unwrap()
                .with_user_agent("pathway-test/1.0"),
        );
        let config = NavigationConfig {
            remote_address: "10.0.0.7".to_string(),
            ..NavigationConfig::default()
        };
        let controller = NavigationController::new(window, config);

        let request = controller.build_request(RequestInit::new("/"));
        assert_eq!(request.header("user-agent"), Some("pathway-test/1.0"));
        assert_eq!(request.connection(), &Connection::new("10.0.0.7", true));
    }

    #[test]
    fn test_get_navigation_pushes_history() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|_, _| {}));

        let request = controller.navigate("/a", false);
        assert!(request.is_complete());
        assert_eq!(
            window.history_log(),
            vec![HistoryUpdate {
                url: "http://app.test/a".to_string(),
                replace: false,
            }]
        );

        controller.navigate("/b", true);
        assert!(window.history_log()[1].replace);
        assert_eq!(window.location_href(), "http://app.test/b");
    }

    #[test]
    fn test_first_navigation_does_not_scroll() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|_, _| {}));
        window.set_scroll_position(0.0, 480.0);

        controller.navigate("/a", false);
        assert!(window.scroll_log().is_empty());
        assert_eq!(window.scroll_position(), (0.0, 480.0));
        assert!(controller.is_started());

        controller.navigate("/b", false);
        assert_eq!(window.scroll_log(), vec![ScrollRecord::To { x: 0.0, y: 0.0 }]);
        assert_eq!(window.scroll_position(), (0.0, 0.0));
    }

    #[test]
    fn test_fragment_scrolls_into_view() {
        let (window, controller) = setup("http://app.test/");
        window.add_element(Arc::new(MemoryElement::new("h2").attr("id", "usage")));
        controller.add_handler(finishing(|_, _| {}));

        controller.navigate("/docs#usage", false);
        assert_eq!(
            window.scroll_log(),
            vec![ScrollRecord::IntoView {
                element_id: Some("usage".to_string()),
                options: ScrollIntoViewOptions {
                    block: ScrollBlock::Start,
                    behavior: ScrollBehavior::Smooth,
                },
            }]
        );

        // Unknown fragment falls back to the scroll-to-top rule.
        controller.navigate("/docs#missing", false);
        assert_eq!(
            window.scroll_log().last(),
            Some(&ScrollRecord::To { x: 0.0, y: 0.0 })
        );
    }

    #[test]
    fn test_cookies_written_one_per_assignment() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|_, res| {
            res.set_header("Set-Cookie", "a=1; b=2; Path=/").unwrap();
        }));

        controller.navigate("/", false);
        assert_eq!(window.cookie_writes(), vec!["a=1; Path=/", "b=2; Path=/"]);
        assert_eq!(window.document_cookie(), "a=1; b=2");
    }

    #[test]
    fn test_redirect_skips_history_for_first_hop() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|req, res| {
            if req.url() == "/old" {
                res.set_header("location", "/new").unwrap();
            }
        }));

        controller.navigate("/old", false);
        assert_eq!(
            window.history_log(),
            vec![HistoryUpdate {
                url: "http://app.test/new".to_string(),
                replace: false,
            }]
        );
    }

    #[test]
    fn test_redirect_loop_stops_at_cap() {
        let (window, controller) = setup("http://app.test/");
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        controller.add_handler(finishing(move |_, res| {
            *counter.lock() += 1;
            res.set_header("location", "/loop").unwrap();
        }));

        let first = controller.navigate("/loop", false);
        assert!(first.is_complete());
        assert_eq!(*calls.lock(), MAX_REDIRECTS + 1);
        assert!(window.history_log().is_empty());
        assert_eq!(window.location_href(), "http://app.test/");
    }

    #[test]
    fn test_refresh_with_location_is_cancelled_by_redirect() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|req, res| {
            if req.url() == "/wait" {
                res.set_header("refresh", "5; url=/a").unwrap();
                res.set_header("location", "/next").unwrap();
            }
        }));

        controller.navigate("/wait", false);
        // The refresh was scheduled, then the redirect's own completion cleared it.
        assert!(!controller.has_pending_refresh());
        assert_eq!(window.pending_timers(), 0);

        window.advance(Duration::from_secs(10));
        assert_eq!(
            window.history_log(),
            vec![HistoryUpdate {
                url: "http://app.test/next".to_string(),
                replace: false,
            }]
        );
    }

    #[test]
    fn test_refresh_with_location_survives_until_redirect_finishes() {
        let (window, controller) = setup("http://app.test/");
        let held = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&held);
        controller.add_handler(Arc::new(move |req: Request, res: Response| {
            if req.url() == "/wait" {
                res.set_header("refresh", "5; url=/a").unwrap();
                res.set_header("location", "/next").unwrap();
                res.end(None).unwrap();
            } else {
                store.lock().push(res);
            }
        }));

        controller.navigate("/wait", false);
        assert!(controller.has_pending_refresh());

        let pending: Vec<Response> = held.lock().drain(..).collect();
        pending[0].end(None).unwrap();
        assert!(!controller.has_pending_refresh());
        assert_eq!(window.location_href(), "http://app.test/next");
    }

    #[test]
    fn test_oversized_refresh_fires_immediately() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|req, res| {
            if req.url() == "/wait" {
                res.set_header("refresh", "99999999999999999999999; url=/a")
                    .unwrap();
            }
        }));

        window.advance(Duration::from_secs(2));
        controller.navigate("/wait", false);
        assert_eq!(window.run_pending(), 1);
        assert_eq!(window.location_href(), "http://app.test/a");
    }

    #[test]
    fn test_post_does_not_touch_address() {
        let (window, controller) = setup("http://app.test/form");
        controller.add_handler(finishing(|_, _| {}));

        let request = controller.navigate(RequestInit::new("/save").method("POST"), false);
        assert!(request.is_complete());
        assert!(window.history_log().is_empty());
        assert_eq!(window.location_href(), "http://app.test/form");
        assert!(!controller.is_started());
    }

    #[test]
    fn test_refresh_schedules_replace_navigation() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|req, res| {
            if req.url() == "/wait" {
                res.set_header("refresh", "5; url=/a").unwrap();
            }
        }));

        controller.navigate("/wait", false);
        assert!(controller.has_pending_refresh());
        assert_eq!(window.pending_timers(), 1);

        assert_eq!(window.advance(Duration::from_millis(4999)), 0);
        assert_eq!(window.advance(Duration::from_millis(1)), 1);
        assert!(!controller.has_pending_refresh());

        let last = window.history_log().pop().unwrap();
        assert_eq!(last.url, "http://app.test/a");
        assert!(last.replace);
    }

    #[test]
    fn test_later_completion_cancels_refresh() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|req, res| {
            if req.url() == "/wait" {
                res.set_header("refresh", "5; url=/a").unwrap();
            }
        }));

        controller.navigate("/wait", false);
        controller.navigate("/other", false);
        assert!(!controller.has_pending_refresh());
        assert_eq!(window.pending_timers(), 0);

        window.advance(Duration::from_secs(10));
        assert!(window
            .history_log()
            .iter()
            .all(|update| update.url != "http://app.test/a"));
    }

    #[test]
    fn test_refresh_without_url_reloads_request() {
        let (window, controller) = setup("http://app.test/");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        controller.add_handler(finishing(move |req, res| {
            let mut log = log.lock();
            if log.is_empty() {
                res.set_header("refresh", "1").unwrap();
            }
            log.push(req.url().to_string());
        }));

        controller.navigate("/poll", false);
        window.advance(Duration::from_secs(1));
        assert_eq!(*seen.lock(), vec!["/poll", "/poll"]);
    }

    #[test]
    fn test_deferred_finish_and_parallel_navigations() {
        let (window, controller) = setup("http://app.test/");
        let held = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&held);
        controller.add_handler(Arc::new(move |req: Request, res: Response| {
            store.lock().push((req, res));
        }));

        let first = controller.navigate("/one", false);
        let second = controller.navigate("/two", false);
        assert!(!first.is_complete());
        assert!(window.history_log().is_empty());

        // Finish out of order: last writer wins the address.
        let pending: Vec<(Request, Response)> = held.lock().drain(..).collect();
        pending[1].1.end(None).unwrap();
        pending[0].1.end(None).unwrap();

        assert!(first.is_complete() && second.is_complete());
        assert_eq!(window.location_href(), "http://app.test/one");
    }

    #[test]
    fn test_unfinished_response_has_no_effect() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(Arc::new(|_req: Request, _res: Response| {}));

        let request = controller.navigate("/hang", false);
        assert!(!request.is_complete());
        assert!(window.history_log().is_empty());
    }

    #[test]
    fn test_prebuilt_request_used_as_is() {
        let (window, controller) = setup("http://app.test/");
        controller.add_handler(finishing(|_, _| {}));

        let request = controller.build_request(RequestInit::new("/built"));
        let emitted = controller.navigate(request.clone(), false);
        assert!(emitted.ptr_eq(&request));
        assert_eq!(controller.last_url(), Some("/built".to_string()));
        assert_eq!(window.location_href(), "http://app.test/built");
    }
}
