//! The per-request facts the evaluator and variable expander read.
//!
//! Built with a setter-style builder in the manner of the reference
//! crate's `ServerCtx`/`RequestCtx`, but consolidated into one type: the
//! evaluator consumes the whole context read-only for a single request,
//! so there is no need for the teacher's pluggable provider chain here.

use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::uri::UriParts;

macro_rules! setter {
    ($field:ident: String) => {
        pub fn $field(mut self, $field: impl Into<String>) -> Self {
            self.$field = Some($field.into());
            self
        }
    };
    ($field:ident: $ty:ty) => {
        pub fn $field(mut self, $field: $ty) -> Self {
            self.$field = Some($field);
            self
        }
    };
}

/// Blocking-lookup results resolved ahead of time by the caller.
///
/// Reverse DNS for `REMOTE_HOST` and forward DNS for `SERVER_NAME`/
/// `SERVER_ADDR` are a source of hidden latency inside a rule evaluator;
/// the specification asks implementations to resolve these before
/// building the context rather than lazily inside the engine. A failed
/// lookup is represented by simply leaving the field unset, which the
/// expander renders as an empty string.
#[derive(Clone, Debug, Default)]
pub struct ResolvedNames {
    pub remote_host: Option<String>,
    pub server_name: Option<String>,
    pub server_addr: Option<String>,
}

/// The complete per-request context consumed by the evaluator and the
/// variable expander.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub(crate) original_uri: String,
    pub(crate) uri_parts: UriParts,
    pub(crate) method: String,
    pub(crate) user_agent: Option<String>,
    pub(crate) sender_addr: Option<IpAddr>,
    pub(crate) sender_port: Option<u16>,
    pub(crate) cookie_string: Option<String>,
    pub(crate) request_time: DateTime<Utc>,
    pub(crate) document_root: Option<String>,
    pub(crate) listening_port: Option<u16>,
    pub(crate) server_string: Option<String>,
    pub(crate) resolved: ResolvedNames,
}

impl RequestContext {
    /// Start a new context for the given original request URI, with the
    /// request time pinned to `request_time` and method defaulted to
    /// `GET`.
    pub fn new(original_uri: impl Into<String>, request_time: DateTime<Utc>) -> Self {
        let original_uri = original_uri.into();
        let uri_parts = UriParts::parse(&original_uri);
        Self {
            original_uri,
            uri_parts,
            method: "GET".to_owned(),
            user_agent: None,
            sender_addr: None,
            sender_port: None,
            cookie_string: None,
            request_time,
            document_root: None,
            listening_port: None,
            server_string: None,
            resolved: ResolvedNames::default(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    setter!(user_agent: String);
    setter!(cookie_string: String);
    setter!(document_root: String);
    setter!(server_string: String);
    setter!(listening_port: u16);

    pub fn sender(mut self, addr: IpAddr, port: u16) -> Self {
        self.sender_addr = Some(addr);
        self.sender_port = Some(port);
        self
    }

    /// Attach pre-resolved DNS names (see [`ResolvedNames`]).
    pub fn resolved_names(mut self, resolved: ResolvedNames) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn original_uri(&self) -> &str {
        &self.original_uri
    }

    pub fn uri_parts(&self) -> &UriParts {
        &self.uri_parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_method_to_get() {
        let ctx = RequestContext::new("http://h/a", Utc::now());
        assert_eq!(ctx.method, "GET");
        assert_eq!(ctx.uri_parts.path, "/a");
    }

    #[test]
    fn builder_chains() {
        let ctx = RequestContext::new("http://h/a", Utc::now())
            .method("POST")
            .user_agent("curl/8.0")
            .cookie_string("sid=1")
            .document_root("/var/www")
            .server_string("acme/1.0")
            .listening_port(8080)
            .sender("127.0.0.1".parse().unwrap(), 9001);
        assert_eq!(ctx.method, "POST");
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(ctx.sender_port, Some(9001));
    }
}
