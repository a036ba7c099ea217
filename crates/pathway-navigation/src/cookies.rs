//! Set-Cookie splitting
//!
//! A server may fold several cookies into one `set-cookie` value, but
//! `document.cookie` takes one cookie per write. Attributes are pulled out
//! once and re-attached to every cookie.

/// Attribute names recognised in a `set-cookie` value, compared
/// case-insensitively
const COOKIE_ATTRIBUTES: &[&str] = &[
    "domain", "path", "expires", "max-age", "httponly", "secure", "samesite",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieBatch {
    /// `name=value` assignments in header order
    pub assignments: Vec<String>,
    /// `"; path=/; secure"`, or empty when the header had no attributes
    pub suffix: String,
}

impl CookieBatch {
    pub fn parse(header: &str) -> Self {
        let mut assignments = Vec::new();
        let mut attributes = Vec::new();

        for token in header.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            if is_attribute(token) {
                attributes.push(token);
            } else {
                assignments.push(token.to_string());
            }
        }

        let suffix = if attributes.is_empty() {
            String::new()
        } else {
            format!("; {}", attributes.join("; "))
        };

        Self {
            assignments,
            suffix,
        }
    }

    /// The strings to assign to `document.cookie`, one per cookie
    pub fn writes(&self) -> impl Iterator<Item = String> + '_ {
        self.assignments
            .iter()
            .map(move |cookie| format!("{}{}", cookie, self.suffix))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

fn is_attribute(token: &str) -> bool {
    let name = token.split('=').next().unwrap_or(token).trim();
    COOKIE_ATTRIBUTES
        .iter()
        .any(|attribute| name.eq_ignore_ascii_case(attribute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cookie() {
        let batch = CookieBatch::parse("session=abc");
        assert_eq!(batch.assignments, vec!["session=abc"]);
        assert_eq!(batch.suffix, "");
        assert_eq!(batch.writes().collect::<Vec<_>>(), vec!["session=abc"]);
    }

    #[test]
    fn test_multiple_cookies_share_attributes() {
        let batch = CookieBatch::parse("a=1; b=2 ;Path=/; c=3; HttpOnly; max-age = 60");

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.suffix, "; Path=/; HttpOnly; max-age = 60");
        assert_eq!(
            batch.writes().collect::<Vec<_>>(),
            vec![
                "a=1; Path=/; HttpOnly; max-age = 60",
                "b=2; Path=/; HttpOnly; max-age = 60",
                "c=3; Path=/; HttpOnly; max-age = 60",
            ]
        );
    }

    #[test]
    fn test_expires_with_comma_stays_whole() {
        let batch = CookieBatch::parse("id=7; Expires=Wed, 21 Oct 2026 07:28:00 GMT; Secure");

        assert_eq!(batch.assignments, vec!["id=7"]);
        assert_eq!(batch.suffix, "; Expires=Wed, 21 Oct 2026 07:28:00 GMT; Secure");
    }

    #[test]
    fn test_empty_tokens_dropped() {
        let batch = CookieBatch::parse(" ; a=1;; ;domain=app.test;");
        assert_eq!(batch.assignments, vec!["a=1"]);
        assert_eq!(batch.suffix, "; domain=app.test");

        assert!(CookieBatch::parse("  ").is_empty());
    }

    #[test]
    fn test_attribute_names_match_whole_name_only() {
        // A cookie that merely contains an attribute name is still a cookie.
        let batch = CookieBatch::parse("xpath=1; secure_id=2");
        assert_eq!(batch.assignments, vec!["xpath=1", "secure_id=2"]);
        assert!(batch.suffix.is_empty());
    }
}
