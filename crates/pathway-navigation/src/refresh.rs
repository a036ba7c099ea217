//! Refresh header parsing
//!
//! `refresh: 5; url=/next`. Seconds are read the way `parseInt` reads
//! them: leading digits only. Anything unparsable or negative becomes a
//! zero delay, which is what a browser does with a NaN timeout.
//!
//! Browsers hold timeouts in a signed 32-bit millisecond count and fire
//! anything larger immediately, so a delay past `MAX_TIMEOUT_MS` is zero
//! too.

use std::time::Duration;

/// Largest timeout a browser honors, in milliseconds
const MAX_TIMEOUT_MS: u64 = i32::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshDirective {
    pub delay: Duration,
    /// `None` means reload the current request URL
    pub url: Option<String>,
}

impl RefreshDirective {
    pub fn parse(value: &str) -> Self {
        let (seconds, rest) = match value.split_once(';') {
            Some((seconds, rest)) => (seconds, Some(rest)),
            None => (value, None),
        };

        let url = rest
            .map(str::trim)
            .map(|rest| strip_url_key(rest).trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Self {
            delay: timeout(leading_seconds(seconds)),
            url,
        }
    }
}

fn timeout(seconds: u64) -> Duration {
    match seconds.checked_mul(1000) {
        Some(ms) if ms <= MAX_TIMEOUT_MS => Duration::from_millis(ms),
        _ => Duration::ZERO,
    }
}

/// `url=/a`, `URL = /a` -> `/a`. Anything else is taken as the URL itself.
fn strip_url_key(rest: &str) -> &str {
    match rest.split_once('=') {
        Some((key, url)) if key.trim().eq_ignore_ascii_case("url") => url,
        _ => rest,
    }
}

fn leading_seconds(raw: &str) -> u64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }

    digits[..end]
        .bytes()
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d - b'0')))
}
