//! The [`RewriteResult`] produced by a single evaluation.

use std::collections::HashMap;

/// Side effects and the final URI produced by evaluating a request
/// against a compiled rule set.
///
/// An unchanged `uri` (equal to `original_uri`) together with empty
/// `cookies`/`env_vars` and no overrides set is a no-op from the
/// caller's perspective.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteResult {
    pub uri: String,
    pub original_uri: String,
    pub cookies: HashMap<String, (String, u64)>,
    pub env_vars: HashMap<String, String>,
    pub server_string: Option<String>,
    pub mime_type: Option<String>,
    pub status_override: Option<u16>,
}

impl RewriteResult {
    /// True if this result changes nothing about the request: the URI
    /// is unchanged and no side effects or overrides were produced.
    pub fn is_noop(&self) -> bool {
        self.uri == self.original_uri
            && self.cookies.is_empty()
            && self.env_vars.is_empty()
            && self.server_string.is_none()
            && self.mime_type.is_none()
            && self.status_override.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_result_is_noop() {
        let r = RewriteResult {
            uri: "http://h/a".into(),
            original_uri: "http://h/a".into(),
            ..Default::default()
        };
        assert!(r.is_noop());
    }

    #[test]
    fn changed_uri_is_not_noop() {
        let r = RewriteResult {
            uri: "http://h/b".into(),
            original_uri: "http://h/a".into(),
            ..Default::default()
        };
        assert!(!r.is_noop());
    }

    #[test]
    fn override_alone_is_not_noop() {
        let r = RewriteResult {
            uri: "http://h/a".into(),
            original_uri: "http://h/a".into(),
            status_override: Some(403),
            ..Default::default()
        };
        assert!(!r.is_noop());
    }
}
