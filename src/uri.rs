//! Minimal URI decomposition used for rewrite composition.
//!
//! The engine only needs five pieces out of a URI — scheme, authority,
//! path, query, fragment — and only ever needs to reassemble them the
//! same way, so a dedicated parser is simpler than pulling in a general
//! purpose URI crate for this one call site.

/// A URI split into its component parts.
///
/// `scheme` and `authority` are `None` for a relative URI (one with no
/// `scheme://` prefix).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UriParts {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UriParts {
    /// Split a URI string into its components.
    pub fn parse(uri: &str) -> Self {
        let (uri, fragment) = match uri.split_once('#') {
            Some((base, frag)) => (base, Some(frag.to_owned())),
            None => (uri, None),
        };
        let (uri, query) = match uri.split_once('?') {
            Some((base, q)) => (base, Some(q.to_owned())),
            None => (uri, None),
        };
        let (scheme, authority, path) = match uri.split_once("://") {
            Some((scheme, rest)) => match rest.split_once('/') {
                Some((authority, path)) => {
                    (Some(scheme.to_owned()), Some(authority.to_owned()), format!("/{path}"))
                }
                None => (Some(scheme.to_owned()), Some(rest.to_owned()), String::new()),
            },
            None => (None, None, uri.to_owned()),
        };
        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }

    /// True if this URI carries no scheme (i.e. is relative).
    #[inline]
    pub fn is_relative(&self) -> bool {
        self.scheme.is_none()
    }

    /// Reassemble the parts back into a single URI string.
    pub fn to_uri_string(&self) -> String {
        let mut out = String::new();
        if let (Some(scheme), Some(authority)) = (&self.scheme, &self.authority) {
            out.push_str(scheme);
            out.push_str("://");
            out.push_str(authority);
        }
        out.push_str(&self.path);
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }

    /// `scheme://authority/` prefix of this URI, used to promote a
    /// relative substitution to absolute. Empty string if this URI is
    /// itself relative.
    pub fn origin_prefix(&self) -> String {
        match (&self.scheme, &self.authority) {
            (Some(scheme), Some(authority)) => format!("{scheme}://{authority}/"),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_uri() {
        let p = UriParts::parse("http://h/old/x?y=2#frag");
        assert_eq!(p.scheme.as_deref(), Some("http"));
        assert_eq!(p.authority.as_deref(), Some("h"));
        assert_eq!(p.path, "/old/x");
        assert_eq!(p.query.as_deref(), Some("y=2"));
        assert_eq!(p.fragment.as_deref(), Some("frag"));
    }

    #[test]
    fn parses_relative_uri() {
        let p = UriParts::parse("/old/x?y=2");
        assert!(p.is_relative());
        assert_eq!(p.path, "/old/x");
        assert_eq!(p.query.as_deref(), Some("y=2"));
    }

    #[test]
    fn round_trips() {
        let s = "http://h/new/x?a=1#f";
        assert_eq!(UriParts::parse(s).to_uri_string(), s);
    }

    #[test]
    fn origin_prefix_is_empty_for_relative() {
        let p = UriParts::parse("/path");
        assert_eq!(p.origin_prefix(), "");
    }

    #[test]
    fn origin_prefix_for_absolute() {
        let p = UriParts::parse("http://h/path");
        assert_eq!(p.origin_prefix(), "http://h/");
    }

    #[test]
    fn authority_only_uri_has_empty_path() {
        let p = UriParts::parse("http://h");
        assert_eq!(p.path, "");
        assert_eq!(p.authority.as_deref(), Some("h"));
    }
}
