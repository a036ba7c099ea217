//! Event classification
//!
//! Pure decisions over a click or submit event: should the emulator take
//! it, and if so where does it go. Every "no" is a silent skip that leaves
//! the browser's own behavior alone.

use pathway_browser::{ClickEvent, Element, SubmitEvent};
use pathway_http::RequestInit;
use std::sync::Arc;
use url::Url;

use crate::error::NavigationError;
use crate::query::with_query;

/// A form submission the emulator will handle
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitNavigation {
    pub request: RequestInit,
    /// False when the form opted out of being reset
    pub reset_form: bool,
}

/// Decide whether a click should become a navigation. Returns the resolved
/// same-origin URL if so.
pub fn classify_click(event: &ClickEvent, location: &Url) -> Option<String> {
    let modifiers = event.modifiers;
    if event.default_prevented()
        || modifiers.meta
        || modifiers.ctrl
        || modifiers.shift
        || event.button != 0
    {
        tracing::trace!(button = event.button, "Skipping prevented or modified click");
        return None;
    }

    let anchor = find_anchor(event.target.clone())?;

    // An empty href points at the document itself.
    let href = anchor.attribute("href")?;
    if anchor.has_attribute("download") {
        tracing::trace!(href = %href, "Skipping download link");
        return None;
    }
    if !targets_self(anchor.attribute("target")) || is_external(anchor.attribute("rel")) {
        tracing::trace!(href = %href, "Skipping link with foreign target or rel=external");
        return None;
    }

    match resolve_same_origin(location, &href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::trace!(href = %href, reason = %e, "Leaving link to the browser");
            None
        }
    }
}

/// Decide whether a form submission should become a navigation.
///
/// GET forms navigate to the action with the fields as its query. Other
/// methods carry the fields as the body, with files and the form's
/// enctype as `content-type`.
pub fn classify_submit(
    event: &SubmitEvent,
    location: &Url,
    no_reset_attribute: &str,
) -> Option<SubmitNavigation> {
    if event.default_prevented() {
        return None;
    }

    let form = &event.form;
    let action = form.action();
    if !targets_self(form.attribute("target")) || is_external(form.attribute("rel")) {
        tracing::trace!(action = %action, "Skipping form with foreign target or rel=external");
        return None;
    }

    let url = match resolve_same_origin(location, &action) {
        Ok(url) => url,
        Err(e) => {
            tracing::trace!(action = %action, reason = %e, "Leaving form to the browser");
            return None;
        }
    };

    let data = form.extract();
    let method = form.method().to_ascii_uppercase();

    let request = if method == "GET" {
        RequestInit::new(with_query(&url, &data.body).to_string())
    } else {
        RequestInit::new(url.to_string())
            .method(method)
            .body(data.body)
            .files(data.files)
            .header("content-type", form.enctype())
    };

    Some(SubmitNavigation {
        request,
        reset_form: !form.has_attribute(no_reset_attribute),
    })
}

/// Resolve `href` against the current address and require the same
/// origin (scheme, host and port).
pub fn resolve_same_origin(location: &Url, href: &str) -> Result<Url, NavigationError> {
    let url = location.join(href)?;
    if url.origin() != location.origin() {
        return Err(NavigationError::CrossOrigin(url.to_string()));
    }
    Ok(url)
}

/// `rel` contains the whitespace-delimited token `external`
pub fn is_external(rel: Option<String>) -> bool {
    rel.map(|rel| rel.split_whitespace().any(|token| token == "external"))
        .unwrap_or(false)
}

fn targets_self(target: Option<String>) -> bool {
    match target {
        Some(target) => target.is_empty() || target == "_self",
        None => true,
    }
}

/// Walk up from the click target to the nearest `<a>`
fn find_anchor(mut node: Option<Arc<dyn Element>>) -> Option<Arc<dyn Element>> {
    while let Some(element) = node {
        if element.node_name().eq_ignore_ascii_case("a") {
            return Some(element);
        }
        node = element.parent();
    }
    None
}
